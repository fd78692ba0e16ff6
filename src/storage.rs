use crate::errors::AppError;
use crate::session::Session;
use std::path::Path;
use tokio::fs;
use tracing::error;

/// Reads the persisted session. Missing or unreadable files mean logged out.
pub async fn load_session(path: &Path) -> Session {
    match fs::read(path).await {
        Ok(bytes) => match serde_json::from_slice(&bytes) {
            Ok(session) => session,
            Err(err) => {
                error!("failed to parse session file: {err}");
                Session::default()
            }
        },
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Session::default(),
        Err(err) => {
            error!("failed to read session file: {err}");
            Session::default()
        }
    }
}

pub async fn persist_session(path: &Path, session: &Session) -> Result<(), AppError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).await?;
        }
    }
    let payload = serde_json::to_vec_pretty(session).map_err(AppError::internal)?;
    fs::write(path, payload).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> std::path::PathBuf {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir()
            .join(format!("absensi_storage_{}_{nanos}", std::process::id()))
            .join(name)
    }

    #[tokio::test]
    async fn missing_file_is_logged_out() {
        let session = load_session(&temp_path("missing.json")).await;
        assert!(!session.is_authenticated());
    }

    #[tokio::test]
    async fn persisted_session_is_reloaded() {
        let path = temp_path("session.json");
        let mut session = Session::default();
        session.mark_authenticated();
        persist_session(&path, &session).await.unwrap();

        assert!(load_session(&path).await.is_authenticated());
    }

    #[tokio::test]
    async fn garbage_file_is_logged_out() {
        let path = temp_path("garbage.json");
        fs::create_dir_all(path.parent().unwrap()).await.unwrap();
        fs::write(&path, b"not json").await.unwrap();
        assert!(!load_session(&path).await.is_authenticated());
    }
}
