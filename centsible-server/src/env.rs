use jsonwebtoken::Algorithm;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::str::FromStr;
use std::sync::RwLock;
use std::time::Duration;

pub struct Conf {
    pub connections: Connections,
    pub hashing: Hashing,
    pub keys: Keys,
    pub lifetimes: Lifetimes,
    pub pages: Pages,
    pub workers: Workers,
}

#[derive(Deserialize, Serialize)]
pub struct RawConf {
    pub connections: Connections,
    pub hashing: Hashing,
    pub keys: RawKeys,
    pub lifetimes: RawLifetimes,
    pub pages: Pages,
    pub workers: Workers,
}

#[derive(Deserialize, Serialize)]
pub struct Connections {
    pub database_uri: String,
    pub redis_uri: String,
    pub max_db_connections: Option<u32>,
}

#[derive(Deserialize, Serialize)]
pub struct Hashing {
    pub hash_length: u32,
    pub hash_iterations: u32,
    pub hash_mem_cost_kib: u32,
    pub hash_threads: u32,
    pub salt_length: u32,
}

pub struct Keys {
    pub token_signing_key: Vec<u8>,
    pub token_signing_algorithm: Algorithm,
    pub hashing_key: Vec<u8>,
}

#[derive(Deserialize, Serialize)]
pub struct RawKeys {
    pub token_signing_key: String,
    pub token_signing_algorithm: String,
    pub hashing_key: String,
}

pub struct Lifetimes {
    pub access_token_lifetime: Duration,
}

#[derive(Deserialize, Serialize)]
pub struct RawLifetimes {
    pub access_token_lifetime_mins: u64,
}

#[derive(Deserialize, Serialize)]
pub struct Pages {
    pub default_offset: i64,
    pub default_limit: i64,
}

#[derive(Deserialize, Serialize)]
pub struct Workers {
    pub actix_workers: Option<usize>,
}

lazy_static! {
    static ref CONF_FILE_PATH: RwLock<String> = RwLock::new(String::from("conf/server-conf.toml"));
    pub static ref CONF: Conf = match build_conf() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("CONFIGURATION ERROR: {e}");
            std::process::exit(1);
        }
    };
}

fn build_conf() -> Result<Conf, String> {
    let conf_file_path = CONF_FILE_PATH.read().expect("Lock was poisoned");

    let mut conf_file = match File::open::<&str>(conf_file_path.as_ref()) {
        Ok(f) => f,
        Err(e) => {
            return Err(format!(
                "Couldn't open configuration file at '{conf_file_path}': {e}"
            ))
        }
    };

    let mut contents = String::new();
    match conf_file.read_to_string(&mut contents) {
        Ok(_) => (),
        Err(_) => {
            return Err(format!(
                "Configuration file at '{conf_file_path}' should be a text file in the TOML format"
            ));
        }
    }

    let raw_conf = match toml::from_str::<RawConf>(&contents) {
        Ok(t) => t,
        Err(e) => return Err(format!("Parsing '{conf_file_path}' failed: {e}")),
    };

    let token_signing_algorithm =
        match Algorithm::from_str(&raw_conf.keys.token_signing_algorithm) {
            Ok(a) => a,
            Err(_) => {
                return Err(format!(
                    "token_signing_algorithm in '{conf_file_path}' is not a recognized algorithm"
                ))
            }
        };

    match token_signing_algorithm {
        Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => (),
        _ => {
            return Err(format!(
                "token_signing_algorithm in '{conf_file_path}' must be an HMAC algorithm \
                 (HS256, HS384, or HS512)"
            ))
        }
    }

    if raw_conf.keys.token_signing_key.len() < 32 {
        return Err(format!(
            "token_signing_key in '{conf_file_path}' must be at least 32 bytes"
        ));
    }

    if raw_conf.pages.default_limit <= 0 {
        return Err(format!(
            "default_limit in '{conf_file_path}' must be a positive integer"
        ));
    }

    if raw_conf.pages.default_offset < 0 {
        return Err(format!(
            "default_offset in '{conf_file_path}' must not be negative"
        ));
    }

    Ok(Conf {
        connections: raw_conf.connections,
        hashing: raw_conf.hashing,
        keys: Keys {
            token_signing_key: raw_conf.keys.token_signing_key.into_bytes(),
            token_signing_algorithm,
            hashing_key: raw_conf.keys.hashing_key.into_bytes(),
        },
        lifetimes: Lifetimes {
            access_token_lifetime: Duration::from_secs(
                raw_conf.lifetimes.access_token_lifetime_mins * 60,
            ),
        },
        pages: raw_conf.pages,
        workers: raw_conf.workers,
    })
}

pub fn initialize(conf_file_path: &str) {
    *CONF_FILE_PATH.write().expect("Lock was poisoned") = String::from(conf_file_path);

    // Forego lazy initialization in order to validate the conf file
    lazy_static::initialize(&crate::env::CONF);
}
