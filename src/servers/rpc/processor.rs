//! It processes one tracker RPC connection: read the request line, run the
//! operation, write the response line.
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

use super::wire::{self, tag, Request};
use super::{validation, RPC_LOG_TARGET};
use crate::core::error::OperationError;
use crate::core::files::FileIndex;
use crate::core::sessions::token::SessionToken;
use crate::core::sessions::{LoginStatus, SessionManager};

/// Upper bound on one request line; longer requests are cut off and fail to
/// parse.
pub const MAX_REQUEST_LINE_BYTES: u64 = 8192;

pub struct Processor {
    session_manager: Arc<SessionManager>,
    file_index: Arc<FileIndex>,
}

impl Processor {
    #[must_use]
    pub fn new(session_manager: &Arc<SessionManager>, file_index: &Arc<FileIndex>) -> Self {
        Self {
            session_manager: session_manager.clone(),
            file_index: file_index.clone(),
        }
    }

    /// It serves one accepted connection. All failures are answered (or, if
    /// the socket itself broke, logged); nothing escapes to the caller.
    pub async fn process(&self, mut stream: TcpStream, remote: SocketAddr) {
        let (read_half, mut write_half) = stream.split();

        let mut line = String::new();
        let mut reader = BufReader::new(read_half).take(MAX_REQUEST_LINE_BYTES);

        let fields = match reader.read_line(&mut line).await {
            Ok(0) => return,
            Ok(_) => self.handle_line(&line),
            Err(e) => {
                tracing::debug!(target: RPC_LOG_TARGET, %remote, err = %e, "could not read request line");
                return;
            }
        };

        let response = wire::encode_response(&fields);

        if let Err(e) = write_half.write_all(response.as_bytes()).await {
            tracing::debug!(target: RPC_LOG_TARGET, %remote, err = %e, "could not write response");
        }
    }

    /// It turns one raw request line into the ordered response strings.
    #[must_use]
    pub fn handle_line(&self, line: &str) -> Vec<String> {
        let request = match wire::parse_request(line) {
            Ok(request) => request,
            Err(e) => {
                tracing::debug!(target: RPC_LOG_TARGET, err = %e, "malformed request");
                return response(tag::ERROR, format!("Malformed request: {e}."));
            }
        };

        if let Err(e) = validation::validate(&request) {
            return response(tag::ERROR, format!("Invalid request: {e}."));
        }

        self.dispatch(request)
    }

    fn dispatch(&self, request: Request) -> Vec<String> {
        match request {
            Request::Connect { name, password, ip, port } => {
                match self.session_manager.login(&name, &password, &ip, port) {
                    Ok(grant) => {
                        let tag = match grant.status {
                            LoginStatus::New => tag::NEW,
                            LoginStatus::Updated => tag::UPDATE,
                            LoginStatus::Unchanged => tag::OK,
                        };
                        response(tag, grant.token.to_string())
                    }
                    Err(e) => failure(&e, login_message(&e, &name)),
                }
            }
            Request::Resume { token, name, ip, port } => {
                match self.session_manager.resume(&SessionToken::from(token), &name, &ip, port) {
                    Ok(grant) => {
                        let tag = if grant.updated { tag::UPDATE } else { tag::OK };
                        response(tag, grant.token.to_string())
                    }
                    Err(e) => failure(
                        &e,
                        credentials_or(&e, "Could not continue session.", || {
                            format!("Could not resume session for {name}. Try again later.")
                        }),
                    ),
                }
            }
            Request::Disconnect { token, name } => {
                match self.session_manager.disconnect(&SessionToken::from(token), &name) {
                    Ok(()) => response(tag::OK, "Disconnected from server.".to_string()),
                    Err(e) => failure(
                        &e,
                        credentials_or(&e, "Could not disconnect.", || "Could not disconnect.".to_string()),
                    ),
                }
            }
            Request::Heartbeat { token, name } => {
                match self.session_manager.heartbeat(&SessionToken::from(token), &name) {
                    Ok(()) => response(tag::OK, "Heartbeat received by server.".to_string()),
                    Err(e) => failure(
                        &e,
                        credentials_or(&e, "Could not send heart beat.", || "Error processing heart beat.".to_string()),
                    ),
                }
            }
            Request::RegisterFile {
                token,
                name,
                file_name,
                file_type,
                file_path,
                file_size,
            } => {
                match self
                    .file_index
                    .register(&SessionToken::from(token), &name, &file_name, &file_type, &file_path, file_size)
                {
                    Ok(()) => response(tag::OK, "File successfully registered on the server.".to_string()),
                    Err(e) => failure(&e, register_message(&e, &file_name)),
                }
            }
            Request::DeregisterFile {
                token,
                name,
                file_name,
                file_type,
                file_path,
            } => {
                match self
                    .file_index
                    .deregister(&SessionToken::from(token), &name, &file_name, &file_type, &file_path)
                {
                    Ok(()) => response(tag::OK, "File deregistered from server.".to_string()),
                    Err(e) => failure(
                        &e,
                        credentials_or(&e, "Could not deregister specified file.", || {
                            format!("Could not remove file {file_name}. Try again later.")
                        }),
                    ),
                }
            }
            Request::GetUserFiles { token, name } => {
                match self.file_index.list(&SessionToken::from(token), &name) {
                    Ok(files) => {
                        let mut fields = vec![tag::OK.to_string()];
                        for file in files {
                            fields.push(file.id.to_string());
                            fields.push(file.name);
                            fields.push(file.file_type);
                            fields.push(file.path);
                            fields.push(file.size.to_string());
                        }
                        fields
                    }
                    Err(e) => failure(&e, list_message(&e)),
                }
            }
            Request::SearchFile { token, name, query } => {
                match self.file_index.search(&SessionToken::from(token), &name, &query) {
                    Ok(hits) => {
                        let mut fields = vec![tag::OK.to_string()];
                        for hit in hits {
                            fields.push(hit.id.to_string());
                            fields.push(hit.name);
                            fields.push(hit.file_type);
                            fields.push(hit.size.to_string());
                        }
                        fields
                    }
                    Err(e) => failure(&e, search_message(&e, &query)),
                }
            }
            Request::GetFileHostInfo { token, name, file_id } => {
                match self.file_index.host_lookup(&SessionToken::from(token), &name, file_id) {
                    Ok(hosts) => {
                        let mut fields = vec![tag::OK.to_string()];
                        for host in hosts {
                            fields.push(host.ip);
                            fields.push(host.port.to_string());
                            fields.push(host.path);
                        }
                        fields
                    }
                    Err(e) => failure(&e, host_lookup_message(&e)),
                }
            }
        }
    }
}

fn response(tag: &str, message: String) -> Vec<String> {
    vec![tag.to_string(), message]
}

/// It maps a failed operation to its wire tag, logging internal faults on
/// the way out. No internal error detail crosses the boundary.
fn failure(error: &OperationError, message: String) -> Vec<String> {
    if error.is_internal() {
        tracing::error!(target: RPC_LOG_TARGET, err = %error, "request failed");
    }

    let tag = match error {
        OperationError::Full => tag::FULL,
        OperationError::Duplicate => tag::COPY,
        OperationError::Credentials => tag::CRED,
        OperationError::Password => tag::PASSWORD,
        OperationError::NotFound => tag::NOT_FOUND,
        OperationError::Storage(_) | OperationError::Internal(_) => tag::ERROR,
    };

    response(tag, message)
}

fn credentials_or(error: &OperationError, cred_context: &str, otherwise: impl FnOnce() -> String) -> String {
    if matches!(error, OperationError::Credentials) {
        format!("{cred_context} Token/Username mismatch.")
    } else {
        otherwise()
    }
}

fn login_message(error: &OperationError, name: &str) -> String {
    match error {
        OperationError::Full => "Server is currently full. Try again later.".to_string(),
        OperationError::Duplicate => {
            "User with this name is already logged in. If you have experienced a disconnect, try again in 2 minutes."
                .to_string()
        }
        OperationError::Password => "Incorrect password was provided.".to_string(),
        _ => format!("Could not log in user {name}. Try again later."),
    }
}

fn register_message(error: &OperationError, file_name: &str) -> String {
    match error {
        OperationError::Credentials => "Could not register file. Token/Username mismatch.".to_string(),
        OperationError::Full => "User has reached maximum number of files.".to_string(),
        OperationError::Duplicate => "Could not register chosen file. File already exists.".to_string(),
        _ => format!("Could not register file {file_name}. Try again later."),
    }
}

fn list_message(error: &OperationError) -> String {
    match error {
        OperationError::Credentials => "Could not return user files. Token/Username mismatch.".to_string(),
        OperationError::NotFound => "No files found.".to_string(),
        _ => "Could not acquire user files. Try again later.".to_string(),
    }
}

fn search_message(error: &OperationError, query: &str) -> String {
    match error {
        OperationError::Credentials => "Could not search for specified files. Token/Username mismatch.".to_string(),
        OperationError::NotFound => format!("No files containing \"{query}\" found."),
        _ => format!("Could not search for \"{query}\". Try again later."),
    }
}

fn host_lookup_message(error: &OperationError) -> String {
    match error {
        OperationError::Credentials => "Could not return file owner info. Token/Username mismatch.".to_string(),
        OperationError::NotFound => "No active file hosts were found. Or file was removed.".to_string(),
        _ => "Could not complete a search for hosts. Try again later.".to_string(),
    }
}
