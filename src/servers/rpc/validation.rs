//! Input length caps enforced at the tracker boundary.
use thiserror::Error;

use super::wire::Request;

pub const USER_NAME_MIN: usize = 5;
pub const USER_NAME_MAX: usize = 25;
pub const PASSWORD_MIN: usize = 6;
pub const PASSWORD_MAX: usize = 50;
pub const FILE_NAME_MAX: usize = 100;
pub const FILE_TYPE_MAX: usize = 25;
pub const FILE_PATH_MAX: usize = 300;
pub const QUERY_MAX: usize = 100;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("user name must be between {USER_NAME_MIN} and {USER_NAME_MAX} characters")]
    UserName,

    #[error("password must be between {PASSWORD_MIN} and {PASSWORD_MAX} characters")]
    Password,

    #[error("file name must be at most {FILE_NAME_MAX} characters")]
    FileName,

    #[error("file type must be at most {FILE_TYPE_MAX} characters")]
    FileType,

    #[error("file path must be at most {FILE_PATH_MAX} characters")]
    FilePath,

    #[error("search query must be at most {QUERY_MAX} characters")]
    Query,
}

/// It checks the length caps for every field of a parsed request.
///
/// Ports and sizes are range-checked by parsing; token strings are opaque
/// and compared byte for byte, so they carry no cap of their own.
///
/// # Errors
///
/// Will return a [`ValidationError`] naming the first field out of bounds.
pub fn validate(request: &Request) -> Result<(), ValidationError> {
    match request {
        Request::Connect { name, password, .. } => {
            check_user_name(name)?;
            check_password(password)
        }
        Request::Resume { name, .. } | Request::Disconnect { name, .. } | Request::Heartbeat { name, .. } | Request::GetUserFiles { name, .. } | Request::GetFileHostInfo { name, .. } => {
            check_user_name(name)
        }
        Request::RegisterFile {
            name,
            file_name,
            file_type,
            file_path,
            ..
        }
        | Request::DeregisterFile {
            name,
            file_name,
            file_type,
            file_path,
            ..
        } => {
            check_user_name(name)?;
            check_file_fields(file_name, file_type, file_path)
        }
        Request::SearchFile { name, query, .. } => {
            check_user_name(name)?;
            if query.chars().count() > QUERY_MAX {
                return Err(ValidationError::Query);
            }
            Ok(())
        }
    }
}

fn check_user_name(name: &str) -> Result<(), ValidationError> {
    let length = name.chars().count();

    if length < USER_NAME_MIN || length > USER_NAME_MAX {
        return Err(ValidationError::UserName);
    }

    Ok(())
}

fn check_password(password: &str) -> Result<(), ValidationError> {
    let length = password.chars().count();

    if length < PASSWORD_MIN || length > PASSWORD_MAX {
        return Err(ValidationError::Password);
    }

    Ok(())
}

fn check_file_fields(file_name: &str, file_type: &str, file_path: &str) -> Result<(), ValidationError> {
    if file_name.chars().count() > FILE_NAME_MAX {
        return Err(ValidationError::FileName);
    }

    if file_type.chars().count() > FILE_TYPE_MAX {
        return Err(ValidationError::FileType);
    }

    if file_path.chars().count() > FILE_PATH_MAX {
        return Err(ValidationError::FilePath);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{validate, ValidationError};
    use crate::servers::rpc::wire::Request;

    fn connect(name: &str, password: &str) -> Request {
        Request::Connect {
            name: name.to_string(),
            password: password.to_string(),
            ip: "10.0.0.1".to_string(),
            port: 1052,
        }
    }

    #[test]
    fn it_should_accept_fields_within_the_caps() {
        assert!(validate(&connect("alice", "pw123456")).is_ok());
    }

    #[test]
    fn it_should_reject_a_short_user_name() {
        assert_eq!(validate(&connect("al", "pw123456")), Err(ValidationError::UserName));
    }

    #[test]
    fn it_should_reject_a_long_user_name() {
        assert_eq!(
            validate(&connect(&"a".repeat(26), "pw123456")),
            Err(ValidationError::UserName)
        );
    }

    #[test]
    fn it_should_reject_a_short_password() {
        assert_eq!(validate(&connect("alice", "pw")), Err(ValidationError::Password));
    }

    #[test]
    fn it_should_reject_an_oversized_file_path() {
        let request = Request::RegisterFile {
            token: "deadbeef".to_string(),
            name: "alice".to_string(),
            file_name: "report".to_string(),
            file_type: "pdf".to_string(),
            file_path: "/".repeat(301),
            file_size: 1024,
        };

        assert_eq!(validate(&request), Err(ValidationError::FilePath));
    }

    #[test]
    fn it_should_reject_an_oversized_query() {
        let request = Request::SearchFile {
            token: "deadbeef".to_string(),
            name: "alice".to_string(),
            query: "q".repeat(101),
        };

        assert_eq!(validate(&request), Err(ValidationError::Query));
    }
}
