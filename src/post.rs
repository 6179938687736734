// Upload flow: the dry-run report, the live login/upload/logout sequence and
// the mapping of both to an exit status.

use std::io::{self, Write};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use log::info;

use crate::api::{Media, MediaClient};
use crate::args::Invocation;
use crate::error::UploadError;

/// How a run ended when it did not hit a precondition failure.
#[derive(Debug, PartialEq)]
pub enum Status {
    DryRun,
    Posted(Media),
    Failed(String),
}

impl Status {
    pub fn exit_code(&self) -> i32 {
        match self {
            Status::DryRun | Status::Posted(_) => 0,
            Status::Failed(_) => 1,
        }
    }
}

/// Print the inputs of a test-mode run.
pub fn dry_run_report<W: Write>(inv: &Invocation, caption: &str, out: &mut W) -> io::Result<()> {
    writeln!(out, "Test mode: not posting to Instagram")?;
    writeln!(out, "Username: {}", inv.username)?;
    writeln!(out, "Password: {}", inv.password)?;
    writeln!(out, "Paths: {:?}", inv.paths)?;
    writeln!(out, "Caption: {}", caption)?;
    Ok(())
}

/// Log in, upload the photo or album, log out.
///
/// An empty path list is rejected before the client is touched. After that
/// any client error ends the sequence; logout is not attempted once login or
/// the upload has failed.
pub fn publish<C: MediaClient>(
    client: &mut C,
    inv: &Invocation,
    caption: &str,
) -> Result<Media, UploadError> {
    if inv.paths.is_empty() {
        return Err(UploadError::NoPaths);
    }

    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        spinner.set_style(style);
    }
    spinner.enable_steady_tick(Duration::from_millis(100));

    let result = upload_sequence(client, inv, caption, &spinner);
    spinner.finish_and_clear();
    result.map_err(UploadError::operational)
}

fn upload_sequence<C: MediaClient>(
    client: &mut C,
    inv: &Invocation,
    caption: &str,
    spinner: &ProgressBar,
) -> anyhow::Result<Media> {
    spinner.set_message("Logging in...");
    info!("logging in as {}", inv.username);
    client.login(&inv.username, &inv.password)?;

    let media = match inv.paths.as_slice() {
        [path] => {
            spinner.set_message("Uploading photo...");
            info!("uploading photo {}", path);
            client.photo_upload(path, caption)?
        }
        paths => {
            spinner.set_message(format!("Uploading album of {} photos...", paths.len()));
            info!("uploading album of {} photos", paths.len());
            client.album_upload(paths, caption)?
        }
    };

    spinner.set_message("Logging out...");
    client.logout()?;
    info!("logged out");
    Ok(media)
}

/// Run one invocation against `client`, writing the report, the media or
/// the operational error to `out`.
pub fn run<C: MediaClient, W: Write>(
    inv: &Invocation,
    caption: &str,
    client: &mut C,
    out: &mut W,
) -> anyhow::Result<Status> {
    if inv.test_mode {
        dry_run_report(inv, caption, out)?;
        return Ok(Status::DryRun);
    }

    match publish(client, inv, caption) {
        Ok(media) => {
            writeln!(out, "{}", media)?;
            Ok(Status::Posted(media))
        }
        Err(UploadError::Operational(msg)) => {
            writeln!(out, "Error: {}", msg)?;
            Ok(Status::Failed(msg))
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;
    use serde_json::json;
    use std::path::PathBuf;

    #[derive(Debug, PartialEq)]
    enum Call {
        Login(String, String),
        Photo(String, String),
        Album(Vec<String>, String),
        Logout,
    }

    #[derive(Default)]
    struct FakeClient {
        calls: Vec<Call>,
        fail_login: bool,
        fail_upload: bool,
        fail_logout: bool,
    }

    impl MediaClient for FakeClient {
        fn login(&mut self, username: &str, password: &str) -> anyhow::Result<()> {
            self.calls.push(Call::Login(username.into(), password.into()));
            if self.fail_login {
                bail!("Login failed: 400 Bad Request - bad password");
            }
            Ok(())
        }

        fn photo_upload(&mut self, path: &str, caption: &str) -> anyhow::Result<Media> {
            self.calls.push(Call::Photo(path.into(), caption.into()));
            if self.fail_upload {
                bail!("Photo upload failed: 500 Internal Server Error - ");
            }
            Ok(Media(json!({"pk": "1", "media_type": 1})))
        }

        fn album_upload(&mut self, paths: &[String], caption: &str) -> anyhow::Result<Media> {
            self.calls.push(Call::Album(paths.to_vec(), caption.into()));
            if self.fail_upload {
                bail!("Album upload failed: 500 Internal Server Error - ");
            }
            Ok(Media(json!({"pk": "2", "media_type": 8})))
        }

        fn logout(&mut self) -> anyhow::Result<()> {
            self.calls.push(Call::Logout);
            if self.fail_logout {
                bail!("Logout failed: 401 Unauthorized - ");
            }
            Ok(())
        }
    }

    fn invocation(paths: &[&str], test_mode: bool) -> Invocation {
        Invocation {
            username: "alice".into(),
            password: "s3cret".into(),
            paths: paths.iter().map(|p| p.to_string()).collect(),
            caption_file: PathBuf::from("caption.txt"),
            test_mode,
        }
    }

    fn run_to_string(inv: &Invocation, client: &mut FakeClient) -> (Status, String) {
        let mut out = Vec::new();
        let status = run(inv, "sunset #nofilter", client, &mut out).unwrap();
        (status, String::from_utf8(out).unwrap())
    }

    #[test]
    fn dry_run_prints_inputs_in_order() {
        let mut client = FakeClient::default();
        let (status, out) = run_to_string(&invocation(&["a.jpg", " b.jpg"], true), &mut client);
        assert_eq!(status, Status::DryRun);
        assert_eq!(status.exit_code(), 0);
        assert_eq!(
            out,
            "Test mode: not posting to Instagram\n\
             Username: alice\n\
             Password: s3cret\n\
             Paths: [\"a.jpg\", \" b.jpg\"]\n\
             Caption: sunset #nofilter\n"
        );
        assert!(client.calls.is_empty());
    }

    #[test]
    fn dry_run_with_no_paths() {
        let mut client = FakeClient::default();
        let (status, out) = run_to_string(&invocation(&[], true), &mut client);
        assert_eq!(status.exit_code(), 0);
        assert!(out.contains("Paths: []"));
        assert!(client.calls.is_empty());
    }

    #[test]
    fn single_path_uses_photo_upload() {
        let mut client = FakeClient::default();
        let (status, out) = run_to_string(&invocation(&["/img/one.jpg"], false), &mut client);
        assert_eq!(status.exit_code(), 0);
        assert!(out.contains("\"pk\": \"1\""));
        assert_eq!(
            client.calls,
            vec![
                Call::Login("alice".into(), "s3cret".into()),
                Call::Photo("/img/one.jpg".into(), "sunset #nofilter".into()),
                Call::Logout,
            ]
        );
    }

    #[test]
    fn several_paths_use_album_upload_in_order() {
        let mut client = FakeClient::default();
        let paths = ["c.jpg", "a.jpg", "b.png"];
        let (status, _) = run_to_string(&invocation(&paths, false), &mut client);
        assert!(matches!(status, Status::Posted(_)));
        assert_eq!(
            client.calls,
            vec![
                Call::Login("alice".into(), "s3cret".into()),
                Call::Album(
                    paths.iter().map(|p| p.to_string()).collect(),
                    "sunset #nofilter".into()
                ),
                Call::Logout,
            ]
        );
    }

    #[test]
    fn empty_path_list_fails_before_any_call() {
        let mut client = FakeClient::default();
        let err = publish(&mut client, &invocation(&[], false), "cap").unwrap_err();
        assert!(matches!(err, UploadError::NoPaths));
        assert!(client.calls.is_empty());

        let mut out = Vec::new();
        let err = run(&invocation(&[], false), "cap", &mut client, &mut out).unwrap_err();
        assert_eq!(err.to_string(), "No paths provided");
        assert!(out.is_empty());
    }

    #[test]
    fn login_failure_reported_and_no_logout() {
        let mut client = FakeClient {
            fail_login: true,
            ..Default::default()
        };
        let (status, out) = run_to_string(&invocation(&["a.jpg"], false), &mut client);
        assert_eq!(status.exit_code(), 1);
        assert_eq!(out, "Error: Login failed: 400 Bad Request - bad password\n");
        assert_eq!(client.calls, vec![Call::Login("alice".into(), "s3cret".into())]);
    }

    #[test]
    fn album_failure_skips_logout() {
        let mut client = FakeClient {
            fail_upload: true,
            ..Default::default()
        };
        let (status, out) = run_to_string(&invocation(&["a.jpg", "b.jpg"], false), &mut client);
        assert_eq!(status.exit_code(), 1);
        assert!(out.starts_with("Error: Album upload failed"));
        assert!(!client.calls.contains(&Call::Logout));
    }

    #[test]
    fn logout_failure_is_operational() {
        let mut client = FakeClient {
            fail_logout: true,
            ..Default::default()
        };
        let (status, out) = run_to_string(&invocation(&["a.jpg"], false), &mut client);
        assert_eq!(status, Status::Failed("Logout failed: 401 Unauthorized - ".into()));
        assert_eq!(out, "Error: Logout failed: 401 Unauthorized - \n");
    }

    #[test]
    fn capitalized_true_is_live_mode() {
        let mut client = FakeClient::default();
        let mut inv = invocation(&["a.jpg"], false);
        inv.test_mode = crate::args::is_test_flag("True");
        let (status, _) = run_to_string(&inv, &mut client);
        assert!(matches!(status, Status::Posted(_)));
        assert_eq!(client.calls.len(), 3);
    }
}
