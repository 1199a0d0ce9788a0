use crate::{
    domain::HomeworkRecord,
    error::{Classify, ErrorKind},
};
use serde::Deserialize;
use serde_json::Value;
use snafu::{OptionExt, ResultExt, Snafu};
use std::collections::HashMap;

const VERDICTS: &[(&str, &str)] = &[
    ("approved", "Работа проверена: ревьюеру всё понравилось. Ура!"),
    ("reviewing", "Работа взята на проверку ревьюером."),
    ("rejected", "Работа проверена: у ревьюера есть замечания."),
];

fn verdict(status: &str) -> Option<&'static str> {
    VERDICTS
        .iter()
        .find(|(s, _)| *s == status)
        .map(|(_, verdict)| *verdict)
}

/// Renders the message announcing a homework's current verdict.
pub fn parse_status(record: &HomeworkRecord) -> Result<String> {
    announcement(record).map(|(_, text)| text)
}

fn announcement(record: &HomeworkRecord) -> Result<(&str, String)> {
    let name = record.homework_name.as_deref().context(MissingNameSnafu)?;
    let status = record
        .status
        .as_deref()
        .context(MissingStatusSnafu { name })?;
    let verdict = verdict(status).context(UnknownStatusSnafu { name, status })?;

    let text = format!(
        "Изменился статус проверки работы \"{}\". {}",
        name, verdict
    );
    Ok((name, text))
}

#[derive(Debug, PartialEq, Eq)]
pub struct Assessment {
    pub name: String,
    pub text: String,
    /// Whether `text` differs from what was last sent for `name`.
    pub changed: bool,
}

/// Last verdict text sent for each homework. Memory only; entries are
/// never evicted.
#[derive(Debug, Default)]
pub struct Tracker {
    last_sent: HashMap<String, String>,
}

impl Tracker {
    pub fn assess(&self, raw: &Value) -> Result<Assessment> {
        let record = HomeworkRecord::deserialize(raw).context(MalformedRecordSnafu)?;
        let (name, text) = announcement(&record)?;
        let changed = self.last_sent.get(name) != Some(&text);

        Ok(Assessment {
            name: name.to_owned(),
            text,
            changed,
        })
    }

    /// Marks a message as sent. Call after every delivery attempt,
    /// successful or not.
    pub fn record(&mut self, assessment: Assessment) {
        self.last_sent.insert(assessment.name, assessment.text);
    }

    pub fn last_sent(&self, name: &str) -> Option<&str> {
        self.last_sent.get(name).map(String::as_str)
    }
}

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("Homework record is malformed"))]
    MalformedRecord { source: serde_json::Error },

    #[snafu(display("Homework record has no \"homework_name\""))]
    MissingName,

    #[snafu(display("Homework {:?} has no status", name))]
    MissingStatus { name: String },

    #[snafu(display("Homework {:?} has an unknown status {:?}", name, status))]
    UnknownStatus { name: String, status: String },
}

impl Classify for Error {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Data
    }
}

type Result<T, E = Error> = std::result::Result<T, E>;
