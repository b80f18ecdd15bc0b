//! Command-line entry point for the volren demo viewer.

use std::path::PathBuf;

use volren::{demos::DemoKind, options::Options, Viewer};

const USAGE: &str = "Usage: volren <mip|peel|ssr> [--options FILE]";

#[derive(Debug)]
struct Args {
    kind: DemoKind,
    options: Option<PathBuf>,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Args, String> {
    let kind = args
        .next()
        .ok_or_else(|| USAGE.to_owned())?
        .parse::<DemoKind>()
        .map_err(|e| format!("{e}\n{USAGE}"))?;

    let mut options = None;
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--options" | "-o" => {
                let path = args.next().ok_or_else(|| format!("--options needs a file\n{USAGE}"))?;
                options = Some(PathBuf::from(path));
            }
            other => return Err(format!("unexpected argument '{other}'\n{USAGE}")),
        }
    }
    Ok(Args { kind, options })
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = match parse_args(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(message) => {
            log::error!("{message}");
            std::process::exit(1);
        }
    };

    let options = match args.options.as_deref().map(Options::load).transpose() {
        Ok(options) => options.unwrap_or_default(),
        Err(e) => {
            log::error!("Failed to load options: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = Viewer::builder()
        .with_demo(args.kind)
        .with_options(options)
        .build()
        .run()
    {
        log::error!("{e}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Args, String> {
        parse_args(args.iter().map(|s| (*s).to_owned()))
    }

    #[test]
    fn demo_and_options_file() {
        let args = parse(&["peel", "--options", "presets/dark.toml"]).unwrap();
        assert_eq!(args.kind, DemoKind::Peel);
        assert_eq!(args.options, Some(PathBuf::from("presets/dark.toml")));
    }

    #[test]
    fn bad_arguments_print_usage() {
        assert!(parse(&[]).unwrap_err().contains("Usage"));
        assert!(parse(&["mip", "--options"]).unwrap_err().contains("Usage"));
        assert!(parse(&["mip", "extra"]).is_err());
        assert!(parse(&["volume"]).is_err());
    }
}
