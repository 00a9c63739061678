//! The `SQLite3` database driver.
use std::sync::Mutex;

use rusqlite::{params, Connection, OptionalExtension};

use super::driver::Driver;
use super::error::Error;
use super::{Database, FileRecord, HostRecord, UserRecord};

const DRIVER: Driver = Driver::Sqlite3;

pub struct Sqlite3 {
    /// A single connection guarded by a mutex, so at most one statement is
    /// in flight at a time.
    connection: Mutex<Connection>,
}

impl Sqlite3 {
    /// It opens (or creates) the database file at `path`. The special path
    /// `:memory:` opens an ephemeral in-memory database.
    ///
    /// # Errors
    ///
    /// Will return an [`Error`] if the file cannot be opened.
    pub fn new(path: &str) -> Result<Self, Error> {
        let connection = Connection::open(path).map_err(|e| Error::unavailable(DRIVER, &e))?;

        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    fn with_connection<T>(&self, operation: impl FnOnce(&Connection) -> Result<T, rusqlite::Error>) -> Result<T, Error> {
        let connection = self.connection.lock().expect("it should be able to lock the sqlite connection");
        operation(&connection).map_err(|e| Error::query(DRIVER, &e))
    }
}

impl Database for Sqlite3 {
    fn setup_schema(&self) -> Result<(), Error> {
        self.with_connection(|connection| {
            connection.execute(
                "CREATE TABLE IF NOT EXISTS users (
                    user_name TEXT PRIMARY KEY,
                    user_password TEXT NOT NULL,
                    user_ip TEXT NOT NULL,
                    user_port INTEGER NOT NULL
                )",
                [],
            )?;
            connection.execute(
                "CREATE TABLE IF NOT EXISTS user_files (
                    file_id INTEGER PRIMARY KEY,
                    file_name TEXT NOT NULL,
                    file_type TEXT NOT NULL,
                    file_path TEXT NOT NULL,
                    file_size INTEGER NOT NULL,
                    user_name TEXT NOT NULL REFERENCES users (user_name),
                    UNIQUE (user_name, file_name, file_type, file_path)
                )",
                [],
            )?;
            Ok(())
        })
    }

    fn probe(&self) -> Result<(), Error> {
        self.with_connection(|connection| connection.query_row("SELECT 1", [], |_| Ok(())))
    }

    fn fetch_user(&self, name: &str) -> Result<Option<UserRecord>, Error> {
        self.with_connection(|connection| {
            connection
                .query_row(
                    "SELECT user_name, user_password, user_ip, user_port FROM users WHERE user_name = ?1",
                    params![name],
                    |row| {
                        Ok(UserRecord {
                            name: row.get(0)?,
                            password_hash: row.get(1)?,
                            ip: row.get(2)?,
                            port: row.get(3)?,
                        })
                    },
                )
                .optional()
        })
    }

    fn insert_user(&self, user: &UserRecord) -> Result<(), Error> {
        self.with_connection(|connection| {
            connection.execute(
                "INSERT INTO users (user_name, user_password, user_ip, user_port) VALUES (?1, ?2, ?3, ?4)",
                params![user.name, user.password_hash, user.ip, user.port],
            )?;
            Ok(())
        })
    }

    fn update_user_ip(&self, name: &str, ip: &str) -> Result<(), Error> {
        let updated = self.with_connection(|connection| {
            connection.execute("UPDATE users SET user_ip = ?1 WHERE user_name = ?2", params![ip, name])
        })?;

        if updated == 0 {
            return Err(Error::NoRowAffected { driver: DRIVER });
        }

        Ok(())
    }

    fn update_user_port(&self, name: &str, port: u16) -> Result<(), Error> {
        let updated = self.with_connection(|connection| {
            connection.execute("UPDATE users SET user_port = ?1 WHERE user_name = ?2", params![port, name])
        })?;

        if updated == 0 {
            return Err(Error::NoRowAffected { driver: DRIVER });
        }

        Ok(())
    }

    fn count_files(&self, owner: &str) -> Result<u64, Error> {
        self.with_connection(|connection| {
            connection.query_row(
                "SELECT COUNT(*) FROM user_files WHERE user_name = ?1",
                params![owner],
                |row| row.get::<_, u64>(0),
            )
        })
    }

    fn file_exists(&self, owner: &str, name: &str, file_type: &str, path: &str) -> Result<bool, Error> {
        self.with_connection(|connection| {
            connection
                .query_row(
                    "SELECT 1 FROM user_files
                     WHERE user_name = ?1 AND file_name = ?2 AND file_type = ?3 AND file_path = ?4",
                    params![owner, name, file_type, path],
                    |_| Ok(()),
                )
                .optional()
                .map(|found| found.is_some())
        })
    }

    fn file_id_in_use(&self, id: u32) -> Result<bool, Error> {
        self.with_connection(|connection| {
            connection
                .query_row("SELECT 1 FROM user_files WHERE file_id = ?1", params![id], |_| Ok(()))
                .optional()
                .map(|found| found.is_some())
        })
    }

    fn insert_file(&self, file: &FileRecord) -> Result<(), Error> {
        self.with_connection(|connection| {
            connection.execute(
                "INSERT INTO user_files (file_id, file_name, file_type, file_path, file_size, user_name)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![file.id, file.name, file.file_type, file.path, file.size, file.owner],
            )?;
            Ok(())
        })
    }

    fn delete_file(&self, owner: &str, name: &str, file_type: &str, path: &str) -> Result<u64, Error> {
        self.with_connection(|connection| {
            let removed = connection.execute(
                "DELETE FROM user_files
                 WHERE user_name = ?1 AND file_name = ?2 AND file_type = ?3 AND file_path = ?4",
                params![owner, name, file_type, path],
            )?;
            Ok(removed as u64)
        })
    }

    fn files_of(&self, owner: &str) -> Result<Vec<FileRecord>, Error> {
        self.with_connection(|connection| {
            let mut statement = connection.prepare(
                "SELECT file_id, file_name, file_type, file_path, file_size, user_name
                 FROM user_files WHERE user_name = ?1",
            )?;
            let rows = statement.query_map(params![owner], file_record_from_row)?;
            rows.collect()
        })
    }

    fn search_files(&self, excluded_owner: &str, query: &str) -> Result<Vec<FileRecord>, Error> {
        let pattern = format!("%{}%", query.to_lowercase());

        self.with_connection(|connection| {
            let mut statement = connection.prepare(
                "SELECT file_id, file_name, file_type, file_path, file_size, user_name
                 FROM user_files
                 WHERE user_name != ?1 AND LOWER(file_name || file_type) LIKE ?2",
            )?;
            let rows = statement.query_map(params![excluded_owner, pattern], file_record_from_row)?;
            rows.collect()
        })
    }

    fn hosts_of(&self, file_id: u32, excluded_owner: &str) -> Result<Vec<HostRecord>, Error> {
        self.with_connection(|connection| {
            let mut statement = connection.prepare(
                "SELECT users.user_name, users.user_ip, users.user_port, user_files.file_path
                 FROM users INNER JOIN user_files ON users.user_name = user_files.user_name
                 WHERE user_files.file_id = ?1 AND user_files.user_name != ?2",
            )?;
            let rows = statement.query_map(params![file_id, excluded_owner], |row| {
                Ok(HostRecord {
                    owner: row.get(0)?,
                    ip: row.get(1)?,
                    port: row.get(2)?,
                    path: row.get(3)?,
                })
            })?;
            rows.collect()
        })
    }
}

fn file_record_from_row(row: &rusqlite::Row<'_>) -> Result<FileRecord, rusqlite::Error> {
    Ok(FileRecord {
        id: row.get(0)?,
        name: row.get(1)?,
        file_type: row.get(2)?,
        path: row.get(3)?,
        size: row.get(4)?,
        owner: row.get(5)?,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::Sqlite3;
    use crate::core::databases::{Database, FileRecord, UserRecord};

    fn ephemeral_database() -> Arc<Box<dyn Database>> {
        let database = Sqlite3::new(":memory:").expect("it should open an in-memory database");
        database.setup_schema().expect("it should create the schema");
        Arc::new(Box::new(database))
    }

    fn sample_user() -> UserRecord {
        UserRecord {
            name: "alice".to_string(),
            password_hash: "$argon2id$stub".to_string(),
            ip: "10.0.0.1".to_string(),
            port: 1052,
        }
    }

    fn sample_file(owner: &str) -> FileRecord {
        FileRecord {
            id: 42,
            name: "report".to_string(),
            file_type: "pdf".to_string(),
            path: "/home/a/".to_string(),
            size: 1024,
            owner: owner.to_string(),
        }
    }

    #[test]
    fn it_should_answer_the_health_probe() {
        let database = ephemeral_database();

        assert!(database.probe().is_ok());
    }

    #[test]
    fn it_should_insert_and_fetch_a_user() {
        let database = ephemeral_database();
        let user = sample_user();

        database.insert_user(&user).unwrap();

        assert_eq!(database.fetch_user("alice").unwrap(), Some(user));
        assert_eq!(database.fetch_user("nobody").unwrap(), None);
    }

    #[test]
    fn it_should_reject_a_duplicate_user_name() {
        let database = ephemeral_database();

        database.insert_user(&sample_user()).unwrap();

        assert!(database.insert_user(&sample_user()).is_err());
    }

    #[test]
    fn it_should_update_ip_and_port_of_an_existing_user() {
        let database = ephemeral_database();
        database.insert_user(&sample_user()).unwrap();

        database.update_user_ip("alice", "10.0.0.9").unwrap();
        database.update_user_port("alice", 2000).unwrap();

        let user = database.fetch_user("alice").unwrap().unwrap();
        assert_eq!(user.ip, "10.0.0.9");
        assert_eq!(user.port, 2000);
    }

    #[test]
    fn it_should_fail_to_update_a_missing_user() {
        let database = ephemeral_database();

        assert!(database.update_user_ip("nobody", "10.0.0.9").is_err());
    }

    mod handling_the_file_catalog {
        use super::{ephemeral_database, sample_file, sample_user};

        #[test]
        fn it_should_insert_count_and_delete_a_registration() {
            let database = ephemeral_database();
            database.insert_user(&sample_user()).unwrap();

            database.insert_file(&sample_file("alice")).unwrap();

            assert_eq!(database.count_files("alice").unwrap(), 1);
            assert!(database.file_exists("alice", "report", "pdf", "/home/a/").unwrap());
            assert!(database.file_id_in_use(42).unwrap());

            let removed = database.delete_file("alice", "report", "pdf", "/home/a/").unwrap();

            assert_eq!(removed, 1);
            assert_eq!(database.count_files("alice").unwrap(), 0);
        }

        #[test]
        fn it_should_reject_a_duplicate_registration_tuple() {
            let database = ephemeral_database();
            database.insert_user(&sample_user()).unwrap();
            database.insert_file(&sample_file("alice")).unwrap();

            let mut copy = sample_file("alice");
            copy.id = 43;

            assert!(database.insert_file(&copy).is_err());
        }

        #[test]
        fn it_should_match_searches_case_insensitively_against_name_and_type() {
            let database = ephemeral_database();
            database.insert_user(&sample_user()).unwrap();
            database.insert_file(&sample_file("alice")).unwrap();

            let hits = database.search_files("bob", "REPORT").unwrap();
            assert_eq!(hits.len(), 1);

            // The query matches the name ∥ type concatenation.
            let hits = database.search_files("bob", "reportpdf").unwrap();
            assert_eq!(hits.len(), 1);

            let hits = database.search_files("bob", "missing").unwrap();
            assert!(hits.is_empty());
        }

        #[test]
        fn it_should_exclude_the_requester_from_searches() {
            let database = ephemeral_database();
            database.insert_user(&sample_user()).unwrap();
            database.insert_file(&sample_file("alice")).unwrap();

            assert!(database.search_files("alice", "report").unwrap().is_empty());
        }

        #[test]
        fn it_should_resolve_hosts_by_file_id_excluding_the_requester() {
            let database = ephemeral_database();
            database.insert_user(&sample_user()).unwrap();
            database.insert_file(&sample_file("alice")).unwrap();

            let hosts = database.hosts_of(42, "bob").unwrap();

            assert_eq!(hosts.len(), 1);
            assert_eq!(hosts[0].ip, "10.0.0.1");
            assert_eq!(hosts[0].port, 1052);
            assert_eq!(hosts[0].path, "/home/a/");

            assert!(database.hosts_of(42, "alice").unwrap().is_empty());
        }
    }
}
