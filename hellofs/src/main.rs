use std::env;
use std::path::PathBuf;

use anyhow::Result;
use fuse_dispatch::ParsedArgs;
use structopt::StructOpt;
use tracing::debug;

#[derive(Debug, StructOpt)]
struct Args {
    #[structopt(name = "MOUNT_POINT", help = "The mount point of hellofs")]
    mount_point: PathBuf,

    #[structopt(
        name = "FUSE_ARGS",
        last = true,
        help = "Options passed to libfuse, such as `-o allow_other` or `-s`"
    )]
    fuse_args: Vec<String>,
}

fn setup_tracing() {
    use tracing_error::ErrorLayer;
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer().pretty())
        .with(ErrorLayer::default())
        .init();
}

fn main() -> Result<()> {
    setup_tracing();
    let args = Args::from_args();
    run(args)
}

#[allow(clippy::unit_arg)]
#[tracing::instrument(err)]
fn run(args: Args) -> Result<()> {
    let cwd = env::current_dir()?;
    let mount_point = cwd.join(&args.mount_point);

    let parsed = fuse_dispatch::parse_args(args.fuse_args)?;
    if !parsed.unhandled.is_empty() {
        anyhow::bail!("unexpected arguments: {:?}", parsed.unhandled);
    }

    debug!(mount_point = %mount_point.display(), options = ?parsed.options);

    serve(mount_point, parsed)
}

#[cfg(feature = "libfuse")]
fn serve(mount_point: PathBuf, parsed: ParsedArgs) -> Result<()> {
    use fuse_dispatch::{LibFuse, Session};
    use hellofs::HelloFs;

    let mut session = Session::new(mount_point, HelloFs::new(), LibFuse);
    let _ = session
        .set_options(parsed.options)
        .set_multithreaded(parsed.multithreaded);
    let ret = session.start();
    session.dispose();
    Ok(ret?)
}

#[cfg(not(feature = "libfuse"))]
fn serve(mount_point: PathBuf, _: ParsedArgs) -> Result<()> {
    anyhow::bail!(
        "cannot mount {}: hellofs was built without the `libfuse` feature",
        mount_point.display()
    )
}
