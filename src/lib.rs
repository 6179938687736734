// Library root
// -----------
// The binary (`main.rs`) parses arguments and hands them to `post::run`.
//
// Module responsibilities:
// - `args`: positional command-line surface and the parsed `Invocation`.
// - `api`: the `MediaClient` seam and its HTTP implementation.
// - `error`: precondition and operational failures of a run.
// - `post`: dry-run report and the login/upload/logout sequence.
pub mod api;
pub mod args;
pub mod error;
pub mod post;
