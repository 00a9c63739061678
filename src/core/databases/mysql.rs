//! The `MySQL` database driver.
use std::sync::Mutex;

use mysql::prelude::Queryable;
use mysql::{Conn, Opts, OptsBuilder};

use super::driver::Driver;
use super::error::Error;
use super::{Database, FileRecord, HostRecord, UserRecord};

const DRIVER: Driver = Driver::MySQL;

pub struct MySql {
    opts: Opts,
    /// The connection is dropped when an I/O error suggests it was lost;
    /// the next operation (or the health probe) re-establishes it.
    connection: Mutex<Option<Conn>>,
}

impl MySql {
    /// It connects to the `MySQL` server described by `url`. The user and
    /// password are supplied separately so they never appear in the url.
    ///
    /// # Errors
    ///
    /// Will return an [`Error`] if the url is malformed or the first
    /// connection cannot be established.
    pub fn new(url: &str, user: Option<&str>, password: Option<&str>) -> Result<Self, Error> {
        let opts = Opts::from_url(url).map_err(|e| Error::InvalidUrl { message: e.to_string() })?;
        let opts: Opts = OptsBuilder::from_opts(opts)
            .user(user)
            .pass(password)
            .into();

        let connection = Conn::new(opts.clone()).map_err(|e| Error::unavailable(DRIVER, &e))?;

        Ok(Self {
            opts,
            connection: Mutex::new(Some(connection)),
        })
    }

    /// It runs `operation` against the guarded connection, reconnecting
    /// first if the previous connection was dropped.
    fn with_connection<T>(&self, operation: impl FnOnce(&mut Conn) -> Result<T, mysql::Error>) -> Result<T, Error> {
        let mut guard = self.connection.lock().expect("it should be able to lock the mysql connection");

        if guard.is_none() {
            match Conn::new(self.opts.clone()) {
                Ok(connection) => *guard = Some(connection),
                Err(e) => return Err(Error::unavailable(DRIVER, &e)),
            }
        }

        let connection = guard.as_mut().expect("the mysql connection should have just been established");

        match operation(connection) {
            Ok(value) => Ok(value),
            Err(e) => {
                if matches!(e, mysql::Error::IoError(_)) {
                    *guard = None;
                    return Err(Error::unavailable(DRIVER, &e));
                }
                Err(Error::query(DRIVER, &e))
            }
        }
    }
}

impl Database for MySql {
    fn setup_schema(&self) -> Result<(), Error> {
        self.with_connection(|connection| {
            connection.query_drop(
                "CREATE TABLE IF NOT EXISTS users (
                    user_name VARCHAR(25) NOT NULL,
                    user_password VARCHAR(128) NOT NULL,
                    user_ip VARCHAR(45) NOT NULL,
                    user_port INT UNSIGNED NOT NULL,
                    PRIMARY KEY (user_name)
                )",
            )?;
            connection.query_drop(
                "CREATE TABLE IF NOT EXISTS user_files (
                    file_id INT UNSIGNED NOT NULL,
                    file_name VARCHAR(100) NOT NULL,
                    file_type VARCHAR(25) NOT NULL,
                    file_path VARCHAR(300) NOT NULL,
                    file_size BIGINT UNSIGNED NOT NULL,
                    user_name VARCHAR(25) NOT NULL,
                    PRIMARY KEY (file_id),
                    UNIQUE KEY owner_file (user_name, file_name, file_type, file_path),
                    FOREIGN KEY (user_name) REFERENCES users (user_name)
                )",
            )?;
            Ok(())
        })
    }

    fn probe(&self) -> Result<(), Error> {
        self.with_connection(|connection| connection.query_drop("SELECT 1"))
    }

    fn fetch_user(&self, name: &str) -> Result<Option<UserRecord>, Error> {
        self.with_connection(|connection| {
            let row: Option<(String, String, String, u16)> = connection.exec_first(
                "SELECT user_name, user_password, user_ip, user_port FROM users WHERE user_name = ?",
                (name,),
            )?;

            Ok(row.map(|(name, password_hash, ip, port)| UserRecord {
                name,
                password_hash,
                ip,
                port,
            }))
        })
    }

    fn insert_user(&self, user: &UserRecord) -> Result<(), Error> {
        self.with_connection(|connection| {
            connection.exec_drop(
                "INSERT INTO users (user_name, user_password, user_ip, user_port) VALUES (?, ?, ?, ?)",
                (user.name.as_str(), user.password_hash.as_str(), user.ip.as_str(), user.port),
            )
        })
    }

    fn update_user_ip(&self, name: &str, ip: &str) -> Result<(), Error> {
        self.with_connection(|connection| {
            connection.exec_drop("UPDATE users SET user_ip = ? WHERE user_name = ?", (ip, name))?;
            Ok(connection.affected_rows())
        })
        .and_then(|updated| {
            if updated == 0 {
                return Err(Error::NoRowAffected { driver: DRIVER });
            }
            Ok(())
        })
    }

    fn update_user_port(&self, name: &str, port: u16) -> Result<(), Error> {
        self.with_connection(|connection| {
            connection.exec_drop("UPDATE users SET user_port = ? WHERE user_name = ?", (port, name))?;
            Ok(connection.affected_rows())
        })
        .and_then(|updated| {
            if updated == 0 {
                return Err(Error::NoRowAffected { driver: DRIVER });
            }
            Ok(())
        })
    }

    fn count_files(&self, owner: &str) -> Result<u64, Error> {
        self.with_connection(|connection| {
            let count: Option<u64> = connection.exec_first("SELECT COUNT(*) FROM user_files WHERE user_name = ?", (owner,))?;
            Ok(count.unwrap_or(0))
        })
    }

    fn file_exists(&self, owner: &str, name: &str, file_type: &str, path: &str) -> Result<bool, Error> {
        self.with_connection(|connection| {
            let found: Option<u8> = connection.exec_first(
                "SELECT 1 FROM user_files
                 WHERE user_name = ? AND file_name = ? AND file_type = ? AND file_path = ?",
                (owner, name, file_type, path),
            )?;
            Ok(found.is_some())
        })
    }

    fn file_id_in_use(&self, id: u32) -> Result<bool, Error> {
        self.with_connection(|connection| {
            let found: Option<u8> = connection.exec_first("SELECT 1 FROM user_files WHERE file_id = ?", (id,))?;
            Ok(found.is_some())
        })
    }

    fn insert_file(&self, file: &FileRecord) -> Result<(), Error> {
        self.with_connection(|connection| {
            connection.exec_drop(
                "INSERT INTO user_files (file_id, file_name, file_type, file_path, file_size, user_name)
                 VALUES (?, ?, ?, ?, ?, ?)",
                (
                    file.id,
                    file.name.as_str(),
                    file.file_type.as_str(),
                    file.path.as_str(),
                    file.size,
                    file.owner.as_str(),
                ),
            )
        })
    }

    fn delete_file(&self, owner: &str, name: &str, file_type: &str, path: &str) -> Result<u64, Error> {
        self.with_connection(|connection| {
            connection.exec_drop(
                "DELETE FROM user_files
                 WHERE user_name = ? AND file_name = ? AND file_type = ? AND file_path = ?",
                (owner, name, file_type, path),
            )?;
            Ok(connection.affected_rows())
        })
    }

    fn files_of(&self, owner: &str) -> Result<Vec<FileRecord>, Error> {
        self.with_connection(|connection| {
            connection.exec_map(
                "SELECT file_id, file_name, file_type, file_path, file_size, user_name
                 FROM user_files WHERE user_name = ?",
                (owner,),
                file_record_from_row,
            )
        })
    }

    fn search_files(&self, excluded_owner: &str, query: &str) -> Result<Vec<FileRecord>, Error> {
        let pattern = format!("%{}%", query.to_lowercase());

        self.with_connection(|connection| {
            connection.exec_map(
                "SELECT file_id, file_name, file_type, file_path, file_size, user_name
                 FROM user_files
                 WHERE user_name != ? AND LOWER(CONCAT(file_name, file_type)) LIKE ?",
                (excluded_owner, pattern),
                file_record_from_row,
            )
        })
    }

    fn hosts_of(&self, file_id: u32, excluded_owner: &str) -> Result<Vec<HostRecord>, Error> {
        self.with_connection(|connection| {
            connection.exec_map(
                "SELECT users.user_name, users.user_ip, users.user_port, user_files.file_path
                 FROM users INNER JOIN user_files ON users.user_name = user_files.user_name
                 WHERE user_files.file_id = ? AND user_files.user_name != ?",
                (file_id, excluded_owner),
                |(owner, ip, port, path): (String, String, u16, String)| HostRecord { owner, ip, port, path },
            )
        })
    }
}

fn file_record_from_row((id, name, file_type, path, size, owner): (u32, String, String, String, u64, String)) -> FileRecord {
    FileRecord {
        id,
        name,
        file_type,
        path,
        size,
        owner,
    }
}
