// Integers are written in groups of 5 bits, most significant group first. The last group of a
// number uses the first 32 characters of the alphabet, earlier groups the last 32. A number never
// starts with an empty continuation group, so the character for one ('w') is free to mark a
// range: "5w9" is 5, 6, 7, 8, 9.
const ENCODING_CHARS: &[u8; 64] =
    b"0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ._";
const CONTINUATION: u8 = 0x20;
const GROUP_MASK: usize = 0x1f;
const RANGE_MARKER: u8 = b'w';

// Decoding refuses to produce more values than this, so that a short range such as "0wzzzzz"
// cannot be used to make us allocate gigabytes.
const MAX_DECODED_LEN: usize = 1 << 16;

fn push_uint(out: &mut String, mut value: usize) {
    let mut groups = [0u8; 13];
    let mut len = 0;
    loop {
        groups[len] = (value & GROUP_MASK) as u8;
        len += 1;
        value >>= 5;
        if value == 0 {
            break;
        }
    }
    for i in (0..len).rev() {
        let group = if i == 0 {
            groups[i]
        } else {
            groups[i] | CONTINUATION
        };
        out.push(ENCODING_CHARS[group as usize] as char);
    }
}

fn char_value(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'z' => Some(c - b'a' + 10),
        b'A'..=b'Z' => Some(c - b'A' + 36),
        b'.' => Some(62),
        b'_' => Some(63),
        _ => None,
    }
}

/// Encodes a list of integers, such as a call node path, into a short URL-safe string.
///
/// Runs of three or more consecutive increasing values are written as ranges.
pub fn encode_uint_array(values: &[usize]) -> String {
    let mut out = String::new();
    let mut i = 0;
    while i < values.len() {
        let mut run_end = i;
        while run_end + 1 < values.len()
            && values[run_end].checked_add(1) == Some(values[run_end + 1])
        {
            run_end += 1;
        }

        push_uint(&mut out, values[i]);
        if run_end - i >= 2 {
            out.push(RANGE_MARKER as char);
            push_uint(&mut out, values[run_end]);
            i = run_end + 1;
        } else {
            i += 1;
        }
    }
    out
}

/// Decodes a string produced by [`encode_uint_array`].
///
/// Returns `None` if the string is malformed: unknown characters, a number or range that is
/// cut off, a range that does not go up, a value that does not fit in `usize`, or more values
/// than any sensible call node path has.
pub fn decode_uint_array(s: &str) -> Option<Vec<usize>> {
    let mut values = Vec::new();
    let mut current: usize = 0;
    let mut in_number = false;
    let mut range_start: Option<usize> = None;

    for c in s.bytes() {
        if c == RANGE_MARKER && !in_number {
            if range_start.is_some() {
                return None;
            }
            range_start = Some(*values.last()?);
            continue;
        }

        let group = char_value(c)?;
        current = current
            .checked_mul(32)?
            .checked_add(usize::from(group) & GROUP_MASK)?;
        if group & CONTINUATION != 0 {
            in_number = true;
            continue;
        }

        match range_start.take() {
            Some(start) => {
                if current <= start || current - start > MAX_DECODED_LEN - values.len() {
                    return None;
                }
                values.extend((start + 1)..=current);
            }
            None => values.push(current),
        }
        if values.len() > MAX_DECODED_LEN {
            return None;
        }
        current = 0;
        in_number = false;
    }

    if in_number || range_start.is_some() {
        return None;
    }
    Some(values)
}
