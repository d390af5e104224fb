use anyhow::Result;
use colored::Colorize;
use serde::Serialize;
use serde_json::Value;
use tabled::builder::Builder;
use tabled::settings::Style;
use usergate_auth::types::UserRecord;

use crate::cli::OutputFormat;

pub fn print_value<T: Serialize>(value: &T, format: OutputFormat) -> Result<()> {
    let value = serde_json::to_value(value)?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&value)?),
        OutputFormat::Table => print_object(&value),
    }
    Ok(())
}

pub fn print_users(users: &[UserRecord], format: OutputFormat) -> Result<()> {
    if matches!(format, OutputFormat::Json) {
        return print_value(&users, format);
    }
    if users.is_empty() {
        println!("No users found.");
        return Ok(());
    }

    let mut builder = Builder::default();
    builder.push_record(["ID", "Name", "Username"]);
    for user in users {
        builder.push_record([user.id.to_string(), user.name.clone(), user.username.clone()]);
    }
    println!("{}", builder.build().with(Style::rounded()));
    Ok(())
}

pub fn print_success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

pub fn print_error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

fn print_object(value: &Value) {
    let Some(obj) = value.as_object() else {
        println!("{value}");
        return;
    };

    let mut builder = Builder::default();
    for (key, value) in obj {
        let rendered = match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        builder.push_record([key.cyan().to_string(), rendered]);
    }
    println!("{}", builder.build().with(Style::rounded()));
}
