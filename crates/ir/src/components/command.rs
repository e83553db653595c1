// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! The kind of command a query runs

use serde::{Deserialize, Serialize};

/// Server command a query maps to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommandType {
    Aggregate,
    CountDocuments,
    DeleteMany,
    DeleteOne,
    Distinct,
    EstimatedDocumentCount,
    FindMany,
    FindOne,
    FindOneAndDelete,
    FindOneAndReplace,
    FindOneAndUpdate,
    InsertMany,
    InsertOne,
    ReplaceOne,
    UpdateMany,
    UpdateOne,
    Upsert,
    RunCommand,
    Unknown,
}

impl CommandType {
    /// Shell spelling of the command
    pub fn canonical(&self) -> &'static str {
        match self {
            CommandType::Aggregate => "aggregate",
            CommandType::CountDocuments => "countDocuments",
            CommandType::DeleteMany => "deleteMany",
            CommandType::DeleteOne => "deleteOne",
            CommandType::Distinct => "distinct",
            CommandType::EstimatedDocumentCount => "estimatedDocumentCount",
            CommandType::FindMany => "find",
            CommandType::FindOne => "findOne",
            CommandType::FindOneAndDelete => "findOneAndDelete",
            CommandType::FindOneAndReplace => "findOneAndReplace",
            CommandType::FindOneAndUpdate => "findOneAndUpdate",
            CommandType::InsertMany => "insertMany",
            CommandType::InsertOne => "insertOne",
            CommandType::ReplaceOne => "replaceOne",
            CommandType::UpdateMany => "updateMany",
            CommandType::UpdateOne => "updateOne",
            CommandType::Upsert => "upsert",
            CommandType::RunCommand => "runCommand",
            CommandType::Unknown => "<unknown>",
        }
    }

    /// Whether the server may use an index to run this command
    pub fn uses_indexes(&self) -> bool {
        !matches!(
            self,
            CommandType::InsertMany
                | CommandType::InsertOne
                | CommandType::ReplaceOne
                | CommandType::RunCommand
                | CommandType::Unknown
        )
    }

    /// Commands that return a cursor and accept `.sort()` / `.limit()`
    pub fn returns_cursor(&self) -> bool {
        matches!(self, CommandType::FindMany | CommandType::Aggregate)
    }

    /// Commands that take an update document as second argument
    pub fn updates_documents(&self) -> bool {
        matches!(
            self,
            CommandType::UpdateOne
                | CommandType::UpdateMany
                | CommandType::FindOneAndUpdate
                | CommandType::Upsert
        )
    }
}

/// Marks a node as a top-level command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IsCommand {
    pub command_type: CommandType,
}

impl IsCommand {
    pub fn new(command_type: CommandType) -> Self {
        Self { command_type }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_usage() {
        assert!(CommandType::FindMany.uses_indexes());
        assert!(CommandType::Aggregate.uses_indexes());
        assert!(!CommandType::InsertOne.uses_indexes());
        assert!(!CommandType::Unknown.uses_indexes());
    }

    #[test]
    fn test_canonical_spelling() {
        assert_eq!(CommandType::FindMany.canonical(), "find");
        assert_eq!(CommandType::FindOneAndUpdate.canonical(), "findOneAndUpdate");
    }
}
