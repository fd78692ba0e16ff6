//! The process-wide "logged in" flag, held as explicit state.
//!
//! Only [`Session::login`] and [`Session::logout`] change it.

use crate::config::Credentials;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    #[serde(rename = "isAuthenticated", default)]
    authenticated: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginError {
    MissingField,
    WrongCredentials,
}

impl LoginError {
    pub fn message(self) -> &'static str {
        match self {
            Self::MissingField => "Username dan password wajib diisi",
            Self::WrongCredentials => "Gagal login. Username atau password salah",
        }
    }
}

impl Session {
    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    pub fn login(
        &mut self,
        credentials: &Credentials,
        username: &str,
        password: &str,
    ) -> Result<(), LoginError> {
        if username.is_empty() || password.is_empty() {
            return Err(LoginError::MissingField);
        }
        if !credentials.matches(username, password) {
            return Err(LoginError::WrongCredentials);
        }
        self.mark_authenticated();
        Ok(())
    }

    pub fn logout(&mut self) {
        self.authenticated = false;
    }

    pub(crate) fn mark_authenticated(&mut self) {
        self.authenticated = true;
    }
}
