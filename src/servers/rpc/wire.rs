//! Request parsing and response encoding for the tracker RPC surface.
use thiserror::Error;

/// Field separator within a request or response line.
pub const FIELD_SEPARATOR: char = '\t';

/// Method names as they appear on the wire.
pub mod method {
    pub const CONNECT: &str = "connectToServer";
    pub const RESUME: &str = "resumeSession";
    pub const DISCONNECT: &str = "disconnectFromServer";
    pub const HEARTBEAT: &str = "sendHeartBeat";
    pub const REGISTER_FILE: &str = "registerFile";
    pub const DEREGISTER_FILE: &str = "deregisterFile";
    pub const GET_USER_FILES: &str = "getUserFiles";
    pub const SEARCH_FILE: &str = "searchFile";
    pub const GET_FILE_HOST_INFO: &str = "getFileHostInfo";
}

/// Outcome tags: the first element of every response.
pub mod tag {
    pub const OK: &str = "OK";
    pub const NEW: &str = "NEW";
    pub const UPDATE: &str = "UPDATE";
    pub const ERROR: &str = "ERROR";
    pub const FULL: &str = "FULL";
    pub const COPY: &str = "COPY";
    pub const CRED: &str = "CRED";
    pub const PASSWORD: &str = "PASSWORD";
    pub const NOT_FOUND: &str = "404";
}

/// A parsed tracker request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Connect {
        name: String,
        password: String,
        ip: String,
        port: u16,
    },
    Resume {
        token: String,
        name: String,
        ip: String,
        port: u16,
    },
    Disconnect {
        token: String,
        name: String,
    },
    Heartbeat {
        token: String,
        name: String,
    },
    RegisterFile {
        token: String,
        name: String,
        file_name: String,
        file_type: String,
        file_path: String,
        file_size: u64,
    },
    DeregisterFile {
        token: String,
        name: String,
        file_name: String,
        file_type: String,
        file_path: String,
    },
    GetUserFiles {
        token: String,
        name: String,
    },
    SearchFile {
        token: String,
        name: String,
        query: String,
    },
    GetFileHostInfo {
        token: String,
        name: String,
        file_id: u32,
    },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("empty request")]
    Empty,

    #[error("unknown method: {0}")]
    UnknownMethod(String),

    #[error("{method} expects {expected} parameters, got {got}")]
    ArgumentCount {
        method: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("{field} is not a valid number: {value}")]
    InvalidNumber { field: &'static str, value: String },
}

/// It parses one request line into a [`Request`].
///
/// # Errors
///
/// Will return a [`ParseError`] if the line is empty, names an unknown
/// method, carries the wrong number of parameters, or a numeric field does
/// not parse.
pub fn parse_request(line: &str) -> Result<Request, ParseError> {
    let line = line.trim_end_matches(['\r', '\n']);

    if line.is_empty() {
        return Err(ParseError::Empty);
    }

    let mut fields = line.split(FIELD_SEPARATOR);
    let method = fields.next().expect("split always yields at least one field");
    let arguments: Vec<&str> = fields.collect();

    match method {
        method::CONNECT => {
            let [name, password, ip, port] = take::<4>(method::CONNECT, &arguments)?;
            Ok(Request::Connect {
                name: name.to_string(),
                password: password.to_string(),
                ip: ip.to_string(),
                port: parse_number(port, "port")?,
            })
        }
        method::RESUME => {
            let [token, name, ip, port] = take::<4>(method::RESUME, &arguments)?;
            Ok(Request::Resume {
                token: token.to_string(),
                name: name.to_string(),
                ip: ip.to_string(),
                port: parse_number(port, "port")?,
            })
        }
        method::DISCONNECT => {
            let [token, name] = take::<2>(method::DISCONNECT, &arguments)?;
            Ok(Request::Disconnect {
                token: token.to_string(),
                name: name.to_string(),
            })
        }
        method::HEARTBEAT => {
            let [token, name] = take::<2>(method::HEARTBEAT, &arguments)?;
            Ok(Request::Heartbeat {
                token: token.to_string(),
                name: name.to_string(),
            })
        }
        method::REGISTER_FILE => {
            let [token, name, file_name, file_type, file_path, file_size] = take::<6>(method::REGISTER_FILE, &arguments)?;
            Ok(Request::RegisterFile {
                token: token.to_string(),
                name: name.to_string(),
                file_name: file_name.to_string(),
                file_type: file_type.to_string(),
                file_path: file_path.to_string(),
                file_size: parse_number(file_size, "file size")?,
            })
        }
        method::DEREGISTER_FILE => {
            let [token, name, file_name, file_type, file_path] = take::<5>(method::DEREGISTER_FILE, &arguments)?;
            Ok(Request::DeregisterFile {
                token: token.to_string(),
                name: name.to_string(),
                file_name: file_name.to_string(),
                file_type: file_type.to_string(),
                file_path: file_path.to_string(),
            })
        }
        method::GET_USER_FILES => {
            let [token, name] = take::<2>(method::GET_USER_FILES, &arguments)?;
            Ok(Request::GetUserFiles {
                token: token.to_string(),
                name: name.to_string(),
            })
        }
        method::SEARCH_FILE => {
            let [token, name, query] = take::<3>(method::SEARCH_FILE, &arguments)?;
            Ok(Request::SearchFile {
                token: token.to_string(),
                name: name.to_string(),
                query: query.to_string(),
            })
        }
        method::GET_FILE_HOST_INFO => {
            let [token, name, file_id] = take::<3>(method::GET_FILE_HOST_INFO, &arguments)?;
            Ok(Request::GetFileHostInfo {
                token: token.to_string(),
                name: name.to_string(),
                file_id: parse_number(file_id, "file id")?,
            })
        }
        unknown => Err(ParseError::UnknownMethod(unknown.to_string())),
    }
}

/// It renders the ordered response strings as one wire line.
#[must_use]
pub fn encode_response(fields: &[String]) -> String {
    let mut line = fields.join(&FIELD_SEPARATOR.to_string());
    line.push('\n');
    line
}

/// It splits a response line back into the ordered strings.
#[must_use]
pub fn decode_response(line: &str) -> Vec<String> {
    line.trim_end_matches(['\r', '\n'])
        .split(FIELD_SEPARATOR)
        .map(ToString::to_string)
        .collect()
}

fn take<'a, const N: usize>(method: &'static str, arguments: &[&'a str]) -> Result<[&'a str; N], ParseError> {
    <[&str; N]>::try_from(arguments.to_vec()).map_err(|_| ParseError::ArgumentCount {
        method,
        expected: N,
        got: arguments.len(),
    })
}

fn parse_number<T: std::str::FromStr>(value: &str, field: &'static str) -> Result<T, ParseError> {
    value.parse().map_err(|_| ParseError::InvalidNumber {
        field,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::{decode_response, encode_response, parse_request, ParseError, Request};

    #[test]
    fn it_should_parse_a_connect_request() {
        let request = parse_request("connectToServer\talice\tpw123456\t10.0.0.1\t1052\n").unwrap();

        assert_eq!(
            request,
            Request::Connect {
                name: "alice".to_string(),
                password: "pw123456".to_string(),
                ip: "10.0.0.1".to_string(),
                port: 1052,
            }
        );
    }

    #[test]
    fn it_should_parse_a_register_request_with_spaces_in_fields() {
        let request = parse_request("registerFile\tdeadbeef\talice\tannual report\tpdf\t/home/a/my docs/\t2048").unwrap();

        assert_eq!(
            request,
            Request::RegisterFile {
                token: "deadbeef".to_string(),
                name: "alice".to_string(),
                file_name: "annual report".to_string(),
                file_type: "pdf".to_string(),
                file_path: "/home/a/my docs/".to_string(),
                file_size: 2048,
            }
        );
    }

    #[test]
    fn it_should_reject_an_empty_line() {
        assert_eq!(parse_request("\n"), Err(ParseError::Empty));
    }

    #[test]
    fn it_should_reject_an_unknown_method() {
        assert_eq!(
            parse_request("shutdownServer\tnow"),
            Err(ParseError::UnknownMethod("shutdownServer".to_string()))
        );
    }

    #[test]
    fn it_should_reject_a_wrong_argument_count() {
        assert_eq!(
            parse_request("sendHeartBeat\tdeadbeef"),
            Err(ParseError::ArgumentCount {
                method: "sendHeartBeat",
                expected: 2,
                got: 1,
            })
        );
    }

    #[test]
    fn it_should_reject_a_port_out_of_range() {
        assert!(matches!(
            parse_request("connectToServer\talice\tpw123456\t10.0.0.1\t70000"),
            Err(ParseError::InvalidNumber { field: "port", .. })
        ));
    }

    #[test]
    fn it_should_round_trip_a_response_line() {
        let fields = vec!["OK".to_string(), "42".to_string(), "report".to_string()];

        let line = encode_response(&fields);

        assert_eq!(line, "OK\t42\treport\n");
        assert_eq!(decode_response(&line), fields);
    }
}
