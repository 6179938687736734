// Entrypoint: parse arguments, read the caption, run the upload against the
// HTTP media client and exit with the status of the run.

use std::io::Write;

use env_logger::Env;
use insta_post::api::ApiClient;
use insta_post::args::{Args, Invocation};
use insta_post::post;

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();

    match run() {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

fn run() -> anyhow::Result<i32> {
    let args = Args::parse_positional();
    let invocation = Invocation::from(&args);
    let caption = invocation.read_caption()?;

    let mut client = ApiClient::from_env()?;
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let status = post::run(&invocation, &caption, &mut client, &mut out)?;
    out.flush()?;
    Ok(status.exit_code())
}
