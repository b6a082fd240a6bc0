use std::fmt;
use std::str::FromStr;

use super::uint_array::{decode_uint_array, encode_uint_array};
use super::{Transform, TransformKind};
use crate::profile::ImplementationFilter;

const TRANSFORM_SEPARATOR: char = '~';
const FIELD_SEPARATOR: char = '-';
const INVERTED_FLAG: &str = "i";

impl fmt::Display for Transform {
    /// Writes the transform in its compact form, e.g. `f-combined-0w2` or `mf-3`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let key = self.kind().short_key();
        match self {
            Transform::FocusSubtree {
                call_node_path,
                implementation,
                inverted,
            } => {
                write!(f, "{}-{}-{}", key, implementation, encode_uint_array(call_node_path))?;
                if *inverted {
                    write!(f, "-{}", INVERTED_FLAG)?;
                }
                Ok(())
            }
            Transform::MergeCallNode {
                call_node_path,
                implementation,
            } => write!(f, "{}-{}-{}", key, implementation, encode_uint_array(call_node_path)),
            Transform::FocusFunction { func_index }
            | Transform::MergeFunction { func_index }
            | Transform::DropFunction { func_index }
            | Transform::CollapseFunctionSubtree { func_index } => {
                write!(f, "{}-{}", key, func_index)
            }
            Transform::CollapseResource {
                resource_index,
                collapsed_func_index,
                implementation,
            } => write!(
                f,
                "{}-{}-{}-{}",
                key, implementation, resource_index, collapsed_func_index
            ),
            Transform::CollapseDirectRecursion {
                func_index,
                implementation,
            } => write!(f, "{}-{}-{}", key, implementation, func_index),
        }
    }
}

impl FromStr for Transform {
    type Err = String;

    /// Parses a single transform in its compact form.
    ///
    /// An unknown implementation filter is read as `combined`. Fields after the last one the
    /// transform uses are ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut fields = s.split(FIELD_SEPARATOR);
        let key = fields.next().unwrap_or_default();
        let kind = match TransformKind::from_short_key(key) {
            Some(kind) => kind,
            None => return Err(format!("unknown transform {:?}", key)),
        };

        let transform = match kind {
            TransformKind::FocusSubtree => {
                let implementation = implementation_field(fields.next());
                let call_node_path = path_field(fields.next())?;
                let inverted = fields.next() == Some(INVERTED_FLAG);
                Transform::FocusSubtree {
                    call_node_path,
                    implementation,
                    inverted,
                }
            }
            TransformKind::FocusFunction => Transform::FocusFunction {
                func_index: index_field(fields.next(), "function")?,
            },
            TransformKind::MergeCallNode => {
                let implementation = implementation_field(fields.next());
                let call_node_path = path_field(fields.next())?;
                Transform::MergeCallNode {
                    call_node_path,
                    implementation,
                }
            }
            TransformKind::MergeFunction => Transform::MergeFunction {
                func_index: index_field(fields.next(), "function")?,
            },
            TransformKind::DropFunction => Transform::DropFunction {
                func_index: index_field(fields.next(), "function")?,
            },
            TransformKind::CollapseResource => {
                let implementation = implementation_field(fields.next());
                let resource_index = index_field(fields.next(), "resource")?;
                let collapsed_func_index = index_field(fields.next(), "collapsed function")?;
                Transform::CollapseResource {
                    resource_index,
                    collapsed_func_index,
                    implementation,
                }
            }
            TransformKind::CollapseDirectRecursion => {
                let implementation = implementation_field(fields.next());
                let func_index = index_field(fields.next(), "function")?;
                Transform::CollapseDirectRecursion {
                    func_index,
                    implementation,
                }
            }
            TransformKind::CollapseFunctionSubtree => Transform::CollapseFunctionSubtree {
                func_index: index_field(fields.next(), "function")?,
            },
        };
        Ok(transform)
    }
}

fn implementation_field(field: Option<&str>) -> ImplementationFilter {
    match field.map(str::parse) {
        Some(Ok(implementation)) => implementation,
        _ => {
            debug!(
                "Unknown implementation filter {:?}, using combined",
                field.unwrap_or_default()
            );
            ImplementationFilter::Combined
        }
    }
}

fn index_field(field: Option<&str>, what: &str) -> Result<usize, String> {
    let field = field.ok_or_else(|| format!("missing {} index", what))?;
    field
        .parse()
        .map_err(|_| format!("invalid {} index {:?}", what, field))
}

fn path_field(field: Option<&str>) -> Result<Vec<usize>, String> {
    let field = field.ok_or_else(|| String::from("missing call node path"))?;
    decode_uint_array(field).ok_or_else(|| format!("invalid call node path {:?}", field))
}

/// Parses a transform stack, such as `f-combined-0w2~mf-3`.
///
/// The format is meant to be robust against URLs that were edited by hand or written by a
/// newer version: malformed transforms are skipped with a warning, and the rest are kept.
pub fn parse_transforms(s: &str) -> Vec<Transform> {
    s.split(TRANSFORM_SEPARATOR)
        .filter(|token| !token.is_empty())
        .filter_map(|token| match token.parse() {
            Ok(transform) => Some(transform),
            Err(e) => {
                warn!("Dropping transform {:?}: {}", token, e);
                None
            }
        })
        .collect()
}

/// Writes a transform stack in the form [`parse_transforms`] reads.
pub fn stringify_transforms(transforms: &[Transform]) -> String {
    let mut out = String::new();
    for (i, transform) in transforms.iter().enumerate() {
        if i != 0 {
            out.push(TRANSFORM_SEPARATOR);
        }
        out.push_str(&transform.to_string());
    }
    out
}
