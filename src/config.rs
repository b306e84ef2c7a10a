use super::git_object::AuthorSignature;
use std::env;

pub const GIT_DIR: &str = ".git";
pub const OBJECTS_DIR: &str = "objects";
pub const REFS_DIR: &str = "refs";
pub const HEAD_FILE: &str = "HEAD";
pub const CONFIG_FILE: &str = "config";

pub const DEFAULT_HEAD: &str = "ref: refs/heads/master\n";
pub const DEFAULT_CONFIG: &str = "[core]\n\trepositoryformatversion = 0\n\tbare = false\n\tautocrlf = false\n";

pub const UPLOAD_PACK_SERVICE: &str = "git-upload-pack";
pub const UPLOAD_PACK_REQUEST: &str = "application/x-git-upload-pack-request";

pub const LOG_FILTER_ENV: &str = "RUST_LOG";
pub const DEFAULT_LOG_FILTER: &str = "warn";

const AUTHOR_NAME_ENV: &str = "GIT_AUTHOR_NAME";
const AUTHOR_EMAIL_ENV: &str = "GIT_AUTHOR_EMAIL";
const AUTHOR_NAME: &str = "git-clone-rs";
const AUTHOR_EMAIL: &str = "git-clone-rs@localhost";

/// Who commits written by this tool are attributed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub name: String,
    pub email: String,
}

impl Identity {
    pub fn from_env() -> Self {
        Self {
            name: env::var(AUTHOR_NAME_ENV).unwrap_or_else(|_| AUTHOR_NAME.into()),
            email: env::var(AUTHOR_EMAIL_ENV).unwrap_or_else(|_| AUTHOR_EMAIL.into()),
        }
    }

    pub fn signature_now(&self) -> AuthorSignature {
        AuthorSignature::now(self.name.as_str(), self.email.as_str())
    }
}

impl Default for Identity {
    fn default() -> Self {
        Self {
            name: AUTHOR_NAME.into(),
            email: AUTHOR_EMAIL.into(),
        }
    }
}
