use std::io::{self, Write};
use std::path::PathBuf;

use clap::{ArgAction, Parser};
use env_logger::Env;
use profmorph::profile::folded::{self, Options};
use profmorph::profile::{filter_thread_by_implementation, ImplementationFilter, Thread};
use profmorph::transforms::TransformStack;

#[derive(Debug, Parser)]
#[clap(
    name = "profmorph-transform",
    about,
    after_help = "\
Transforms are written the way a profile URL stores them, separated by '~':

    f-combined-0w2      focus on the call node with function path [0, 1, 2]
    f-js-3-i            focus on function 3 in the inverted tree
    ff-3                focus on function 3
    mcn-combined-0w2    merge the call node with function path [0, 1, 2]
    mf-3                merge function 3 into its callers
    df-3                drop samples that went through function 3
    cr-combined-1-42    collapse resource 1 into a new function, which gets index 42
    rec-combined-3      collapse direct recursion of function 3
    cfs-3               collapse everything function 3 calls into it

Use --funcs to look up function and resource indices.
    "
)]
struct Opt {
    // ************* //
    // *** FLAGS *** //
    // ************* //
    /// Print the functions of the input, with their index and resource, and exit
    #[clap(long = "funcs")]
    funcs: bool,

    /// Write the transformed thread as JSON instead of folded stacks
    #[clap(long = "json")]
    json: bool,

    /// Don't turn 'module`function' frames into library resources
    #[clap(long = "no-resources")]
    no_resources: bool,

    /// Silence all log output
    #[clap(short = 'q', long = "quiet")]
    quiet: bool,

    /// Verbose logging mode (-v, -vv, -vvv)
    #[clap(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,

    // *************** //
    // *** OPTIONS *** //
    // *************** //
    /// Transform stack to apply, e.g. "mf-3~rec-combined-7"
    #[clap(short = 't', long = "transforms", value_name = "STRING", default_value = "")]
    transforms: String,

    /// Only show frames of this implementation in the output [combined, cpp, js]
    #[clap(
        long = "implementation",
        value_name = "FILTER",
        default_value = "combined"
    )]
    implementation: ImplementationFilter,

    // ************ //
    // *** ARGS *** //
    // ************ //
    /// Folded stack file, or STDIN if not specified
    #[clap(value_name = "PATH")]
    infile: Option<PathBuf>,
}

impl Opt {
    fn into_parts(self) -> (Option<PathBuf>, Options) {
        let options = Options {
            resources: !self.no_resources,
            ..Default::default()
        };
        (self.infile, options)
    }
}

fn main() -> io::Result<()> {
    let opt = Opt::parse();

    // Initialize logger
    if !opt.quiet {
        env_logger::Builder::from_env(Env::default().default_filter_or(match opt.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }))
        .format_timestamp(None)
        .init();
    }

    let funcs = opt.funcs;
    let json = opt.json;
    let implementation = opt.implementation;
    // Parsed only now, so that dropped transforms are logged.
    let transforms: TransformStack = match opt.transforms.parse() {
        Ok(transforms) => transforms,
        Err(never) => match never {},
    };

    let (infile, options) = opt.into_parts();
    let profile = folded::profile_from_file(&options, infile.as_ref())?;
    let thread = profile
        .threads
        .first()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "profile has no threads"))?;

    let stdout = io::stdout();
    let mut writer = io::BufWriter::new(stdout.lock());
    if funcs {
        write_funcs(thread, &mut writer)?;
        return writer.flush();
    }

    let default_category = profile.meta.default_category();
    let thread = transforms.apply(thread, default_category);
    let thread = filter_thread_by_implementation(&thread, implementation, default_category);

    if json {
        serde_json::to_writer_pretty(&mut writer, &thread)?;
        writeln!(writer)?;
    } else {
        folded::write_thread(&thread, &mut writer)?;
    }
    writer.flush()
}

fn write_funcs<W: Write>(thread: &Thread, mut writer: W) -> io::Result<()> {
    for func in 0..thread.func_table.length {
        let resource = match thread.func_table.resource[func] {
            Some(resource) => format!(
                "{}\t{}",
                resource,
                thread.string(thread.resource_table.name[resource])
            ),
            None => String::from("-\t-"),
        };
        writeln!(writer, "{}\t{}\t{}", func, thread.func_name(func), resource)?;
    }
    Ok(())
}
