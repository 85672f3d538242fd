use bson::Document;
use mongodb::options::{
    DeleteManyModel, DeleteOneModel, InsertOneModel, ReplaceOneModel, UpdateManyModel,
    UpdateOneModel, WriteModel,
};
use mongodb::Namespace;
use serde::Serialize;

/// A single write in a collection-scoped bulk request
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum BulkOperation {
    InsertOne { document: Document },
    UpdateOne { filter: Document, update: Document },
    UpdateMany { filter: Document, update: Document },
    ReplaceOne { filter: Document, replacement: Document },
    DeleteOne { filter: Document },
    DeleteMany { filter: Document },
}

impl BulkOperation {
    pub fn insert_one(document: Document) -> Self {
        Self::InsertOne { document }
    }

    pub fn update_one(filter: Document, update: Document) -> Self {
        Self::UpdateOne { filter, update }
    }

    pub fn update_many(filter: Document, update: Document) -> Self {
        Self::UpdateMany { filter, update }
    }

    pub fn replace_one(filter: Document, replacement: Document) -> Self {
        Self::ReplaceOne {
            filter,
            replacement,
        }
    }

    pub fn delete_one(filter: Document) -> Self {
        Self::DeleteOne { filter }
    }

    pub fn delete_many(filter: Document) -> Self {
        Self::DeleteMany { filter }
    }

    /// Address this operation to `namespace` as a driver write model
    pub fn into_write_model(self, namespace: &Namespace) -> WriteModel {
        let namespace = namespace.clone();
        match self {
            Self::InsertOne { document } => WriteModel::InsertOne(
                InsertOneModel::builder()
                    .namespace(namespace)
                    .document(document)
                    .build(),
            ),
            Self::UpdateOne { filter, update } => WriteModel::UpdateOne(
                UpdateOneModel::builder()
                    .namespace(namespace)
                    .filter(filter)
                    .update(update)
                    .build(),
            ),
            Self::UpdateMany { filter, update } => WriteModel::UpdateMany(
                UpdateManyModel::builder()
                    .namespace(namespace)
                    .filter(filter)
                    .update(update)
                    .build(),
            ),
            Self::ReplaceOne {
                filter,
                replacement,
            } => WriteModel::ReplaceOne(
                ReplaceOneModel::builder()
                    .namespace(namespace)
                    .filter(filter)
                    .replacement(replacement)
                    .build(),
            ),
            Self::DeleteOne { filter } => WriteModel::DeleteOne(
                DeleteOneModel::builder()
                    .namespace(namespace)
                    .filter(filter)
                    .build(),
            ),
            Self::DeleteMany { filter } => WriteModel::DeleteMany(
                DeleteManyModel::builder()
                    .namespace(namespace)
                    .filter(filter)
                    .build(),
            ),
        }
    }
}

/// Bind every operation to the same collection namespace, preserving order
pub fn bind_to_namespace(
    operations: Vec<BulkOperation>,
    namespace: &Namespace,
) -> Vec<WriteModel> {
    operations
        .into_iter()
        .map(|operation| operation.into_write_model(namespace))
        .collect()
}
