//! It serves a single inbound peer request by streaming file bytes.
use std::io;
use std::net::SocketAddr;

use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

use super::protocol::{self, CHUNK_SIZE, NOT_FOUND_RESPONSE};

/// It serves one accepted socket. Transfer faults are logged; they never
/// escalate past the task.
pub async fn serve(socket: TcpStream, remote: SocketAddr) {
    if let Err(e) = handle(socket).await {
        tracing::warn!(%remote, err = %e, "file send failed");
    }
}

async fn handle(mut socket: TcpStream) -> io::Result<()> {
    let (read_half, mut write_half) = socket.split();

    let mut line = String::new();
    BufReader::new(read_half).read_line(&mut line).await?;

    let Some(path) = protocol::parse_request_line(&line) else {
        tracing::warn!(request = line.trim_end(), "unparseable peer request");
        return Ok(());
    };

    let mut file = match File::open(&path).await {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            write_half.write_all(NOT_FOUND_RESPONSE).await?;
            return Ok(());
        }
        Err(e) => {
            tracing::warn!(path = %path, err = %e, "could not open requested file");
            return Ok(());
        }
    };

    tracing::debug!(path = %path, "sending file to peer");

    // Raw bytes until EOF; the receiver has no length prefix to rely on.
    let mut buffer = [0u8; CHUNK_SIZE];
    loop {
        let read = file.read(&mut buffer).await?;
        if read == 0 {
            break;
        }
        write_half.write_all(&buffer[..read]).await?;
    }

    write_half.flush().await?;

    Ok(())
}
