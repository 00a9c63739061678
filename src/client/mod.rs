//! A client for the tracker RPC surface.
//!
//! It speaks the same one-line-per-request framing as the server and hands
//! back the ordered response strings untouched, so callers can match on the
//! outcome tag directly. Used by the peer agent and by the integration
//! tests.
use std::net::SocketAddr;

use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

use crate::servers::rpc::wire::{self, method, FIELD_SEPARATOR};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("could not reach the tracker: {0}")]
    Io(#[from] std::io::Error),

    #[error("the tracker closed the connection without a response")]
    EmptyResponse,

    #[error("a request field contains a separator character")]
    IllegalField,
}

/// One tracker endpoint. Each call opens a fresh connection, sends one
/// request line and reads one response line.
#[derive(Debug, Clone)]
pub struct TrackerClient {
    tracker_addr: SocketAddr,
}

impl TrackerClient {
    #[must_use]
    pub fn new(tracker_addr: SocketAddr) -> Self {
        Self { tracker_addr }
    }

    /// `connectToServer`: log in, returning `[tag, token-or-message]`.
    ///
    /// # Errors
    ///
    /// Will return a [`ClientError`] if the exchange fails.
    pub async fn connect_to_server(&self, name: &str, password: &str, ip: &str, port: u16) -> Result<Vec<String>, ClientError> {
        self.call(&[method::CONNECT, name, password, ip, &port.to_string()]).await
    }

    /// `resumeSession`: rotate the session token after a transport drop.
    ///
    /// # Errors
    ///
    /// Will return a [`ClientError`] if the exchange fails.
    pub async fn resume_session(&self, token: &str, name: &str, ip: &str, port: u16) -> Result<Vec<String>, ClientError> {
        self.call(&[method::RESUME, token, name, ip, &port.to_string()]).await
    }

    /// `disconnectFromServer`.
    ///
    /// # Errors
    ///
    /// Will return a [`ClientError`] if the exchange fails.
    pub async fn disconnect_from_server(&self, token: &str, name: &str) -> Result<Vec<String>, ClientError> {
        self.call(&[method::DISCONNECT, token, name]).await
    }

    /// `sendHeartBeat`.
    ///
    /// # Errors
    ///
    /// Will return a [`ClientError`] if the exchange fails.
    pub async fn send_heart_beat(&self, token: &str, name: &str) -> Result<Vec<String>, ClientError> {
        self.call(&[method::HEARTBEAT, token, name]).await
    }

    /// `registerFile`.
    ///
    /// # Errors
    ///
    /// Will return a [`ClientError`] if the exchange fails.
    pub async fn register_file(
        &self,
        token: &str,
        name: &str,
        file_name: &str,
        file_type: &str,
        file_path: &str,
        file_size: u64,
    ) -> Result<Vec<String>, ClientError> {
        self.call(&[
            method::REGISTER_FILE,
            token,
            name,
            file_name,
            file_type,
            file_path,
            &file_size.to_string(),
        ])
        .await
    }

    /// `deregisterFile`.
    ///
    /// # Errors
    ///
    /// Will return a [`ClientError`] if the exchange fails.
    pub async fn deregister_file(
        &self,
        token: &str,
        name: &str,
        file_name: &str,
        file_type: &str,
        file_path: &str,
    ) -> Result<Vec<String>, ClientError> {
        self.call(&[method::DEREGISTER_FILE, token, name, file_name, file_type, file_path])
            .await
    }

    /// `getUserFiles`: `[OK, id, name, type, path, size, ...]` on success.
    ///
    /// # Errors
    ///
    /// Will return a [`ClientError`] if the exchange fails.
    pub async fn get_user_files(&self, token: &str, name: &str) -> Result<Vec<String>, ClientError> {
        self.call(&[method::GET_USER_FILES, token, name]).await
    }

    /// `searchFile`: `[OK, id, name, type, size, ...]` on success.
    ///
    /// # Errors
    ///
    /// Will return a [`ClientError`] if the exchange fails.
    pub async fn search_file(&self, token: &str, name: &str, query: &str) -> Result<Vec<String>, ClientError> {
        self.call(&[method::SEARCH_FILE, token, name, query]).await
    }

    /// `getFileHostInfo`: `[OK, ip, port, path, ...]` on success.
    ///
    /// # Errors
    ///
    /// Will return a [`ClientError`] if the exchange fails.
    pub async fn get_file_host_info(&self, token: &str, name: &str, file_id: u32) -> Result<Vec<String>, ClientError> {
        self.call(&[method::GET_FILE_HOST_INFO, token, name, &file_id.to_string()])
            .await
    }

    async fn call(&self, fields: &[&str]) -> Result<Vec<String>, ClientError> {
        if fields.iter().any(|field| field.contains([FIELD_SEPARATOR, '\n', '\r'])) {
            return Err(ClientError::IllegalField);
        }

        let mut stream = TcpStream::connect(self.tracker_addr).await?;

        let mut line = fields.join(&FIELD_SEPARATOR.to_string());
        line.push('\n');

        stream.write_all(line.as_bytes()).await?;

        let (read_half, _write_half) = stream.split();
        let mut reader = BufReader::new(read_half);

        let mut response = String::new();
        let read = reader.read_line(&mut response).await?;

        if read == 0 {
            return Err(ClientError::EmptyResponse);
        }

        Ok(wire::decode_response(&response))
    }
}
