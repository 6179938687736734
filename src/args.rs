// Command-line surface: five positional arguments in a fixed order. Every
// argument is plain text; nothing on the command line is read as an option.

use std::ffi::OsString;
use std::fs;
use std::path::PathBuf;

use clap::Parser;

use crate::error::UploadError;

/// Upload one photo or an album of photos with a caption.
#[derive(Parser, Debug)]
#[command(name = "insta-post", disable_help_flag = true, disable_version_flag = true)]
pub struct Args {
    /// Account username
    #[arg(allow_hyphen_values = true)]
    pub username: String,

    /// Account password
    #[arg(allow_hyphen_values = true)]
    pub password: String,

    /// Comma separated image paths, in album order
    #[arg(allow_hyphen_values = true)]
    pub paths: String,

    /// File holding the caption text
    #[arg(allow_hyphen_values = true)]
    pub caption_file: PathBuf,

    /// `true` prints the inputs instead of posting; anything else posts
    #[arg(allow_hyphen_values = true)]
    pub test: String,
}

impl Args {
    /// Parse the process arguments.
    pub fn parse_positional() -> Self {
        Self::parse_from(escape(std::env::args_os()))
    }

    pub fn try_parse_positional<I, T>(argv: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        Self::try_parse_from(escape(argv))
    }
}

/// Put `--` after the program name so values like `-V`, `--help` or `--`
/// land in the positionals.
fn escape<I, T>(argv: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let mut argv = argv.into_iter().map(Into::into);
    let mut escaped: Vec<OsString> = argv.next().into_iter().collect();
    escaped.push(OsString::from("--"));
    escaped.extend(argv);
    escaped
}

/// Inputs of a single run, after splitting the path list and reading the
/// test flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub username: String,
    pub password: String,
    pub paths: Vec<String>,
    pub caption_file: PathBuf,
    pub test_mode: bool,
}

impl Invocation {
    pub fn read_caption(&self) -> Result<String, UploadError> {
        fs::read_to_string(&self.caption_file).map_err(|source| UploadError::Caption {
            path: self.caption_file.clone(),
            source,
        })
    }
}

impl From<&Args> for Invocation {
    fn from(args: &Args) -> Self {
        Invocation {
            username: args.username.clone(),
            password: args.password.clone(),
            paths: split_paths(&args.paths),
            caption_file: args.caption_file.clone(),
            test_mode: is_test_flag(&args.test),
        }
    }
}

/// Split on commas only. Whitespace is part of the path and an empty input
/// yields one empty path.
pub fn split_paths(raw: &str) -> Vec<String> {
    raw.split(',').map(str::to_string).collect()
}

/// Only the exact text `true` selects test mode.
pub fn is_test_flag(flag: &str) -> bool {
    flag == "true"
}
