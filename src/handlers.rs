use tracing::debug;

use crate::cache::ExpiringCache;
use crate::config::Config;
use crate::error::CommandError;
use crate::frame::Frame;

#[derive(Debug, PartialEq, Eq)]
pub enum Command {
    Ping(Option<String>),
    Echo(String),
    Set {
        key: String,
        value: String,
        ttl: Option<Expiry>,
    },
    Get(String),
    Del(Vec<String>),
    Exists(Vec<String>),
    Pttl(String),
    DbSize,
    FlushAll,
    ConfigGet(String),
}

/// TTL option of a SET, kept signed until the cache validates it.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Expiry {
    Millis(i64),
    Seconds(i64),
}

impl Expiry {
    fn as_millis(self) -> i64 {
        match self {
            Expiry::Millis(ms) => ms,
            Expiry::Seconds(s) => s.saturating_mul(1000),
        }
    }
}

impl Command {
    pub fn from_frame(frame: Frame) -> Result<Command, CommandError> {
        let Frame::Array(items) = frame else {
            return Err(CommandError::UnexpectedFormat);
        };

        let mut parts = items
            .into_iter()
            .map(unpack_bulk_str)
            .collect::<Result<Vec<_>, _>>()?
            .into_iter();

        let name = parts.next().ok_or(CommandError::UnexpectedFormat)?;
        let args: Vec<String> = parts.collect();

        match name.to_uppercase().as_str() {
            "PING" => match args.len() {
                0 => Ok(Command::Ping(None)),
                1 => Ok(Command::Ping(args.into_iter().next())),
                _ => Err(CommandError::WrongArity("ping")),
            },
            "ECHO" => single(args, "echo").map(Command::Echo),
            "SET" => parse_set(args),
            "GET" => single(args, "get").map(Command::Get),
            "DEL" => at_least_one(args, "del").map(Command::Del),
            "EXISTS" => at_least_one(args, "exists").map(Command::Exists),
            "PTTL" => single(args, "pttl").map(Command::Pttl),
            "DBSIZE" => none(args, "dbsize").map(|_| Command::DbSize),
            "FLUSHALL" => none(args, "flushall").map(|_| Command::FlushAll),
            "CONFIG" => parse_config(args),
            _ => Err(CommandError::Unknown(name)),
        }
    }

    /// Runs the command against `cache` and builds the reply.
    pub fn execute(self, cache: &mut ExpiringCache<String>, config: &Config) -> Frame {
        debug!(command = ?self, "executing");

        match self {
            Command::Ping(None) => Frame::SimpleString("PONG".to_string()),
            Command::Ping(Some(msg)) | Command::Echo(msg) => Frame::BulkString(msg),
            Command::Set { key, value, ttl } => handle_set(cache, key, value, ttl),
            Command::Get(key) => match cache.get(&key) {
                Some(value) => Frame::bulk(value.as_str()),
                None => Frame::NullBulkString,
            },
            Command::Del(keys) => count(keys, |key| cache.delete(key)),
            Command::Exists(keys) => count(keys, |key| cache.has(key)),
            Command::Pttl(key) => match cache.time_to_live(&key) {
                Some(ttl) => Frame::Integer(ttl.as_millis() as i64),
                None => Frame::Integer(-2),
            },
            Command::DbSize => Frame::Integer(cache.len() as i64),
            Command::FlushAll => {
                cache.clear();
                Frame::ok()
            }
            Command::ConfigGet(name) => match config.get(&name) {
                Some(value) => Frame::Array(vec![Frame::BulkString(name), Frame::BulkString(value)]),
                None => Frame::Array(vec![]),
            },
        }
    }
}

fn handle_set(
    cache: &mut ExpiringCache<String>,
    key: String,
    value: String,
    ttl: Option<Expiry>,
) -> Frame {
    let result = match ttl {
        Some(expiry) => cache.set_millis(key, value, expiry.as_millis()),
        None => cache.set(key, value, None),
    };

    match result {
        Ok(()) => Frame::ok(),
        Err(e) => error_reply(&CommandError::Cache(e)),
    }
}

pub fn error_reply(err: &CommandError) -> Frame {
    Frame::Error(format!("ERR {err}"))
}

fn count(keys: Vec<String>, mut f: impl FnMut(&str) -> bool) -> Frame {
    Frame::Integer(keys.iter().filter(|key| f(key)).count() as i64)
}

fn parse_set(args: Vec<String>) -> Result<Command, CommandError> {
    let mut args = args.into_iter();
    let (Some(key), Some(value)) = (args.next(), args.next()) else {
        return Err(CommandError::WrongArity("set"));
    };

    let ttl = match (args.next(), args.next()) {
        (None, _) => None,
        (Some(unit), Some(amount)) => {
            let amount = amount
                .parse::<i64>()
                .map_err(|_| CommandError::NotAnInteger)?;
            match unit.to_lowercase().as_str() {
                "px" => Some(Expiry::Millis(amount)),
                "ex" => Some(Expiry::Seconds(amount)),
                _ => return Err(CommandError::Syntax),
            }
        }
        (Some(_), None) => return Err(CommandError::Syntax),
    };

    if args.next().is_some() {
        return Err(CommandError::Syntax);
    }

    Ok(Command::Set { key, value, ttl })
}

fn parse_config(args: Vec<String>) -> Result<Command, CommandError> {
    let mut args = args.into_iter();
    match (args.next(), args.next(), args.next()) {
        (Some(sub), Some(name), None) if sub.eq_ignore_ascii_case("get") => {
            Ok(Command::ConfigGet(name.to_lowercase()))
        }
        (Some(_), Some(_), None) => Err(CommandError::Syntax),
        _ => Err(CommandError::WrongArity("config")),
    }
}

fn single(args: Vec<String>, name: &'static str) -> Result<String, CommandError> {
    let mut args = args.into_iter();
    match (args.next(), args.next()) {
        (Some(arg), None) => Ok(arg),
        _ => Err(CommandError::WrongArity(name)),
    }
}

fn at_least_one(args: Vec<String>, name: &'static str) -> Result<Vec<String>, CommandError> {
    if args.is_empty() {
        return Err(CommandError::WrongArity(name));
    }

    Ok(args)
}

fn none(args: Vec<String>, name: &'static str) -> Result<(), CommandError> {
    if !args.is_empty() {
        return Err(CommandError::WrongArity(name));
    }

    Ok(())
}

fn unpack_bulk_str(frame: Frame) -> Result<String, CommandError> {
    match frame {
        Frame::BulkString(s) => Ok(s),
        _ => Err(CommandError::UnexpectedFormat),
    }
}
