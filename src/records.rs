//! # Command Records
//!
//! The generic request/response envelope every service in the host framework
//! speaks: a [`ServiceRequest`] names its target service and carries a
//! [`CommandRecordSet`], an insertion-ordered map of command keys to
//! [`Command`]s, each holding ordered [`Row`]s of named [`FieldValue`]s.
//!
//! Iteration order is significant: push messages are emitted in command
//! insertion order, then row order within each command.

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;

/// Scalar value of one row field
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    #[default]
    Null,
    Text(String),
}

impl FieldValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Null => None,
            FieldValue::Text(value) => Some(value.as_str()),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<Option<String>> for FieldValue {
    fn from(value: Option<String>) -> Self {
        value.map(FieldValue::Text).unwrap_or(FieldValue::Null)
    }
}

/// One record of a command: field name to value
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row {
    fields: HashMap<String, FieldValue>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
        self.fields.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// Text value of `name`; `None` when the field is absent or null
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(FieldValue::as_str)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// How the handler should interpret `command_text`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommandKind {
    #[default]
    Text,
    StoredProcedure,
}

/// A named operation and its rows
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    #[serde(default)]
    pub command_text: String,
    #[serde(default)]
    pub kind: CommandKind,
    #[serde(default)]
    pub rows: Vec<Row>,
}

impl Command {
    pub fn new(command_text: impl Into<String>) -> Self {
        Self {
            command_text: command_text.into(),
            ..Self::default()
        }
    }

    pub fn with_kind(mut self, kind: CommandKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn push_row(&mut self, row: Row) {
        self.rows.push(row);
    }

    /// Set a parameter on the current row, starting the first row if needed
    pub fn add_parameter(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
        if self.rows.is_empty() {
            self.rows.push(Row::new());
        }
        if let Some(row) = self.rows.last_mut() {
            row.set(name, value);
        }
    }

    /// Start a new row carrying the current row's field names with null values
    pub fn new_row(&mut self) {
        let row = self
            .rows
            .last()
            .map(|current| {
                current
                    .field_names()
                    .fold(Row::new(), |row, name| row.with(name, FieldValue::Null))
            })
            .unwrap_or_default();
        self.rows.push(row);
    }

    /// Set a value on the current row
    pub fn set_value(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
        self.add_parameter(name, value);
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// Insertion-ordered map of command key to [`Command`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandRecordSet {
    commands: Vec<(String, Command)>,
}

impl CommandRecordSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace `key`; a replaced key keeps its original position
    pub fn insert(&mut self, key: impl Into<String>, command: Command) {
        let key = key.into();
        match self.commands.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, slot)) => *slot = command,
            None => self.commands.push((key, command)),
        }
    }

    pub fn with_command(mut self, key: impl Into<String>, command: Command) -> Self {
        self.insert(key, command);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Command> {
        self.commands
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, command)| command)
    }

    /// Command for `key`, appended empty when not yet present
    pub fn command_mut(&mut self, key: &str) -> &mut Command {
        let index = match self.commands.iter().position(|(existing, _)| existing == key) {
            Some(index) => index,
            None => {
                self.commands.push((key.to_string(), Command::default()));
                self.commands.len() - 1
            }
        };
        &mut self.commands[index].1
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Command)> {
        self.commands
            .iter()
            .map(|(key, command)| (key.as_str(), command))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.commands.iter().map(|(key, _)| key.as_str())
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Rows across every command
    pub fn total_rows(&self) -> usize {
        self.commands.iter().map(|(_, command)| command.rows.len()).sum()
    }
}

impl Serialize for CommandRecordSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.commands.len()))?;
        for (key, command) in &self.commands {
            map.serialize_entry(key, command)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for CommandRecordSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RecordSetVisitor;

        impl<'de> Visitor<'de> for RecordSetVisitor {
            type Value = CommandRecordSet;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of command keys to commands")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut records = CommandRecordSet::new();
                while let Some((key, command)) = access.next_entry::<String, Command>()? {
                    records.insert(key, command);
                }
                Ok(records)
            }
        }

        deserializer.deserialize_map(RecordSetVisitor)
    }
}

/// Request envelope routed to a service by name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceRequest {
    #[serde(default)]
    pub service_name: Option<String>,
    #[serde(default)]
    pub transaction_scope: bool,
    #[serde(default)]
    pub commands: CommandRecordSet,
}

impl ServiceRequest {
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: Some(service_name.into()),
            ..Self::default()
        }
    }

    pub fn with_transaction_scope(mut self, transaction_scope: bool) -> Self {
        self.transaction_scope = transaction_scope;
        self
    }

    pub fn with_commands(mut self, commands: CommandRecordSet) -> Self {
        self.commands = commands;
        self
    }

    pub fn command_mut(&mut self, key: &str) -> &mut Command {
        self.commands.command_mut(key)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    #[serde(rename = "OK")]
    Ok,
    Error,
}

/// Status/message envelope returned by every service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Response {
    pub fn ok() -> Self {
        Self {
            status: Status::Ok,
            message: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: Status::Error,
            message: Some(message.into()),
        }
    }

    pub fn from_error(error: &dyn std::error::Error) -> Self {
        Self::error(error.to_string())
    }

    pub fn is_ok(&self) -> bool {
        self.status == Status::Ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_set_preserves_insertion_order() {
        let mut records = CommandRecordSet::new();
        records.insert("b", Command::new("second"));
        records.insert("a", Command::new("first"));
        records.insert("b", Command::new("replaced"));

        let keys: Vec<&str> = records.keys().collect();
        assert_eq!(keys, vec!["b", "a"]);
        assert_eq!(records.get("b").unwrap().command_text, "replaced");
    }

    #[test]
    fn test_record_set_json_keeps_key_order() {
        let raw = json!({
            "zeta": {"command_text": "z", "rows": [{"Token": "t1"}]},
            "alpha": {"command_text": "a", "rows": [{"Token": null}]}
        })
        .to_string();

        let records: CommandRecordSet = serde_json::from_str(&raw).unwrap();
        let keys: Vec<&str> = records.keys().collect();
        assert_eq!(keys, vec!["zeta", "alpha"]);

        let alpha = records.get("alpha").unwrap();
        assert_eq!(alpha.rows[0].get("Token"), Some(&FieldValue::Null));
        assert_eq!(records.get("zeta").unwrap().rows[0].text("Token"), Some("t1"));
    }

    #[test]
    fn test_parameter_builders() {
        let mut request = ServiceRequest::new("Push.Service.FcmPushService");
        let command = request.command_mut("1");
        command.add_parameter("Token", "first");
        command.add_parameter("Title", "Hello");
        command.new_row();
        command.set_value("Token", "second");

        assert_eq!(command.row_count(), 2);
        assert_eq!(command.rows[0].text("Title"), Some("Hello"));
        assert_eq!(command.rows[1].text("Token"), Some("second"));
        assert_eq!(command.rows[1].get("Title"), Some(&FieldValue::Null));
    }

    #[test]
    fn test_response_serialization() {
        let value = serde_json::to_value(Response::ok()).unwrap();
        assert_eq!(value, json!({"status": "OK"}));

        let error = Response::error("boom");
        assert!(!error.is_ok());
        assert_eq!(error.message.as_deref(), Some("boom"));
    }
}
