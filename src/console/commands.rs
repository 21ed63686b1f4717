//! Console command implementations.
//!
//! Every command writes its result or a `** ... **` message to `out`.
//! Storage failures are returned to the caller.

use std::io::Write;

use serde_json::Value;
use tracing::debug;

use super::error::ConsoleResult;
use super::parser::{parse_param, unquote};
use crate::models::{AttrValue, ClassName, Entity, ModelError};
use crate::storage::Storage;

pub const CLASS_MISSING: &str = "** class name missing **";
pub const CLASS_UNKNOWN: &str = "** class doesn't exist **";
pub const ID_MISSING: &str = "** instance id missing **";
pub const NOT_FOUND: &str = "** no instance found **";
pub const ATTRIBUTE_MISSING: &str = "** attribute name missing **";
pub const VALUE_MISSING: &str = "** value missing **";
pub const ATTRIBUTE_UNKNOWN: &str = "** attribute doesn't exist **";
pub const ATTRIBUTE_READ_ONLY: &str = "** attribute can't be updated **";
pub const INVALID_VALUE: &str = "** invalid value **";

/// Resolve the class argument, printing the matching message on failure.
fn resolve_class<W: Write>(arg: Option<&String>, out: &mut W) -> ConsoleResult<Option<ClassName>> {
    let Some(name) = arg else {
        writeln!(out, "{}", CLASS_MISSING)?;
        return Ok(None);
    };
    match name.parse::<ClassName>() {
        Ok(class) => Ok(Some(class)),
        Err(_) => {
            writeln!(out, "{}", CLASS_UNKNOWN)?;
            Ok(None)
        }
    }
}

/// Resolve `<Class> <id>` to a stored entity.
async fn lookup<S: Storage, W: Write>(
    storage: &S,
    class: Option<&String>,
    id: Option<&String>,
    out: &mut W,
) -> ConsoleResult<Option<Entity>> {
    let Some(class) = resolve_class(class, out)? else {
        return Ok(None);
    };
    let Some(id) = id else {
        writeln!(out, "{}", ID_MISSING)?;
        return Ok(None);
    };
    match storage.get(class, unquote(id)).await? {
        Some(entity) => Ok(Some(entity)),
        None => {
            writeln!(out, "{}", NOT_FOUND)?;
            Ok(None)
        }
    }
}

fn model_error_message(e: &ModelError) -> &'static str {
    match e {
        ModelError::UnknownAttribute { .. } => ATTRIBUTE_UNKNOWN,
        ModelError::ReadOnlyAttribute { .. } => ATTRIBUTE_READ_ONLY,
        ModelError::UnknownClass { .. } => CLASS_UNKNOWN,
        ModelError::TypeMismatch { .. }
        | ModelError::Reconstruct { .. }
        | ModelError::TimestampOverflow { .. }
        | ModelError::Serialize { .. } => INVALID_VALUE,
    }
}

/// `create <Class> [key=value ...]`
pub async fn create<S: Storage, W: Write>(
    storage: &mut S,
    args: &[String],
    out: &mut W,
) -> ConsoleResult<()> {
    let Some(class) = resolve_class(args.first(), out)? else {
        return Ok(());
    };

    let mut entity = class.instantiate();
    for token in &args[1..] {
        let Some((key, value)) = parse_param(token) else {
            debug!(token = %token, "Dropping unparsable parameter");
            continue;
        };
        if let Err(e) = entity.set_attribute(&key, value) {
            debug!(token = %token, error = %e, "Dropping parameter");
        }
    }

    storage.save_entity(&mut entity).await?;
    writeln!(out, "{}", entity.id())?;
    Ok(())
}

/// `show <Class> <id>`
pub async fn show<S: Storage, W: Write>(
    storage: &S,
    args: &[String],
    out: &mut W,
) -> ConsoleResult<()> {
    if let Some(entity) = lookup(storage, args.first(), args.get(1), out).await? {
        writeln!(out, "{}", entity)?;
    }
    Ok(())
}

/// `destroy <Class> <id>`
pub async fn destroy<S: Storage, W: Write>(
    storage: &mut S,
    args: &[String],
    out: &mut W,
) -> ConsoleResult<()> {
    if let Some(entity) = lookup(storage, args.first(), args.get(1), out).await? {
        storage.destroy(&entity).await?;
    }
    Ok(())
}

/// `all [<Class>]`
pub async fn all<S: Storage, W: Write>(
    storage: &S,
    args: &[String],
    out: &mut W,
) -> ConsoleResult<()> {
    let class = match args.first() {
        Some(_) => match resolve_class(args.first(), out)? {
            Some(class) => Some(class),
            None => return Ok(()),
        },
        None => None,
    };

    let listing: Vec<String> = storage
        .all(class)
        .await?
        .values()
        .map(ToString::to_string)
        .collect();
    let json = serde_json::to_string(&listing).unwrap_or_else(|_| "[]".to_string());
    writeln!(out, "{}", json)?;
    Ok(())
}

/// `count [<Class>]`
pub async fn count<S: Storage, W: Write>(
    storage: &S,
    args: &[String],
    out: &mut W,
) -> ConsoleResult<()> {
    let class = match args.first() {
        Some(_) => match resolve_class(args.first(), out)? {
            Some(class) => Some(class),
            None => return Ok(()),
        },
        None => None,
    };
    writeln!(out, "{}", storage.count(class).await?)?;
    Ok(())
}

/// `update <Class> <id> <attribute> <value>`
pub async fn update<S: Storage, W: Write>(
    storage: &mut S,
    args: &[String],
    out: &mut W,
) -> ConsoleResult<()> {
    let Some(mut entity) = lookup(storage, args.first(), args.get(1), out).await? else {
        return Ok(());
    };
    let Some(name) = args.get(2) else {
        writeln!(out, "{}", ATTRIBUTE_MISSING)?;
        return Ok(());
    };
    let Some(raw) = args.get(3) else {
        writeln!(out, "{}", VALUE_MISSING)?;
        return Ok(());
    };

    if let Err(e) = entity.set_attribute_raw(unquote(name), unquote(raw)) {
        writeln!(out, "{}", model_error_message(&e))?;
        return Ok(());
    }
    storage.save_entity(&mut entity).await?;
    Ok(())
}

/// `<Class>.update("<id>", {"key": value, ...})`
///
/// Nothing is saved unless every pair is accepted.
pub async fn update_from_json<S: Storage, W: Write>(
    storage: &mut S,
    class: &str,
    id: &str,
    json: &str,
    out: &mut W,
) -> ConsoleResult<()> {
    let class = class.to_string();
    let id = (!id.is_empty()).then(|| id.to_string());
    let Some(mut entity) = lookup(storage, Some(&class), id.as_ref(), out).await? else {
        return Ok(());
    };

    let Ok(Value::Object(pairs)) = serde_json::from_str::<Value>(json) else {
        writeln!(out, "{}", INVALID_VALUE)?;
        return Ok(());
    };

    for (name, value) in &pairs {
        let Some(value) = AttrValue::from_json(value) else {
            writeln!(out, "{}", INVALID_VALUE)?;
            return Ok(());
        };
        if let Err(e) = entity.set_attribute(name, value) {
            writeln!(out, "{}", model_error_message(&e))?;
            return Ok(());
        }
    }

    storage.save_entity(&mut entity).await?;
    Ok(())
}

pub const COMMANDS: [(&str, &str); 8] = [
    ("create", "create <Class> [key=value ...]: create an instance and print its id"),
    ("show", "show <Class> <id>: print an instance"),
    ("destroy", "destroy <Class> <id>: delete an instance"),
    ("all", "all [<Class>]: print every instance, or every instance of a class"),
    ("count", "count [<Class>]: print the number of instances"),
    ("update", "update <Class> <id> <attribute> <value>: set one attribute"),
    ("help", "help [<command>]: list commands or describe one"),
    ("quit", "quit: exit the console (EOF also exits)"),
];

/// `help [<command>]`
pub fn help<W: Write>(args: &[String], out: &mut W) -> ConsoleResult<()> {
    match args.first() {
        Some(topic) => match COMMANDS.iter().find(|(name, _)| *name == topic.as_str()) {
            Some((_, text)) => writeln!(out, "{}", text)?,
            None => writeln!(out, "*** No help on {}", topic)?,
        },
        None => {
            writeln!(out, "Documented commands (type help <topic>):")?;
            let names: Vec<&str> = COMMANDS.iter().map(|(name, _)| *name).collect();
            writeln!(out, "{}", names.join("  "))?;
            writeln!(out, "Dot syntax: <Class>.all() <Class>.count() <Class>.show(\"<id>\")")?;
            writeln!(
                out,
                "            <Class>.destroy(\"<id>\") <Class>.update(\"<id>\", \"<attribute>\", <value>)"
            )?;
            writeln!(out, "            <Class>.update(\"<id>\", {{<attribute>: <value>, ...}})")?;
        }
    }
    Ok(())
}
