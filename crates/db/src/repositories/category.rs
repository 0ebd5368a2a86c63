//! Category repository.
//!
//! Names are unique ignoring case. The lowercased name lives in `name_norm`,
//! which carries the unique index; the explicit lookup before each write
//! turns a clash into `DuplicateCategory` instead of a constraint error.

use chrono::Utc;
use sea_orm::ActiveValue::{Set, Unchanged};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder,
};

use budget_core::ledger::{Category, CategoryType, LedgerError, validation::validate_category};
use budget_shared::types::CategoryId;

use super::db_error;
use crate::entities::{categories, sea_orm_active_enums, transactions};

/// Input for creating or updating a category.
#[derive(Debug, Clone)]
pub struct CategoryInput {
    /// Name, unique ignoring case.
    pub name: String,
    /// Optional free text.
    pub description: Option<String>,
    /// Income or expense.
    pub category_type: CategoryType,
}

fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Repository for category operations.
#[derive(Debug, Clone)]
pub struct CategoryRepository {
    db: DatabaseConnection,
}

impl CategoryRepository {
    /// Creates a new category repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a category.
    ///
    /// # Errors
    ///
    /// Returns `InvalidCategory`, `DuplicateCategory`, or a database error.
    pub async fn create(&self, input: CategoryInput) -> Result<Category, LedgerError> {
        let category = Category {
            id: CategoryId::new(),
            name: input.name,
            description: input.description,
            category_type: input.category_type,
        };
        validate_category(&category)?;
        self.ensure_name_free(&category).await?;

        let now = Utc::now();
        categories::ActiveModel {
            id: Set(category.id.into_inner()),
            name: Set(category.name.clone()),
            name_norm: Set(normalize(&category.name)),
            description: Set(category.description.clone()),
            category_type: Set(category.category_type.into()),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.db)
        .await
        .map_err(db_error)?;

        tracing::info!(
            category_id = %category.id,
            name = %category.name,
            category_type = %category.category_type,
            "Category created"
        );
        Ok(category)
    }

    /// Replaces a category's name, description and type.
    ///
    /// The category may keep its own name.
    ///
    /// # Errors
    ///
    /// Returns `CategoryNotFound`, `InvalidCategory`, `DuplicateCategory`, or
    /// a database error.
    pub async fn update(
        &self,
        id: CategoryId,
        input: CategoryInput,
    ) -> Result<Category, LedgerError> {
        let mut category = self.find_by_id(id).await?;
        category.name = input.name;
        category.description = input.description;
        category.category_type = input.category_type;
        validate_category(&category)?;
        self.ensure_name_free(&category).await?;

        categories::ActiveModel {
            id: Unchanged(id.into_inner()),
            name: Set(category.name.clone()),
            name_norm: Set(normalize(&category.name)),
            description: Set(category.description.clone()),
            category_type: Set(category.category_type.into()),
            updated_at: Set(Utc::now()),
            ..Default::default()
        }
        .update(&self.db)
        .await
        .map_err(db_error)?;

        Ok(category)
    }

    /// Deletes a category that no transaction is filed under.
    ///
    /// # Errors
    ///
    /// Returns `CategoryNotFound`, `InvalidCategory` while transactions still
    /// use the category, or a database error.
    pub async fn delete(&self, id: CategoryId) -> Result<(), LedgerError> {
        self.find_by_id(id).await?;

        let references = transactions::Entity::find()
            .filter(transactions::Column::CategoryId.eq(id.into_inner()))
            .count(&self.db)
            .await
            .map_err(db_error)?;

        if references > 0 {
            return Err(LedgerError::InvalidCategory(format!(
                "Category has {references} recorded transactions and cannot be deleted"
            )));
        }

        categories::Entity::delete_by_id(id.into_inner())
            .exec(&self.db)
            .await
            .map_err(db_error)?;

        tracing::info!(category_id = %id, "Category deleted");
        Ok(())
    }

    /// Loads a category.
    ///
    /// # Errors
    ///
    /// Returns `CategoryNotFound` or a database error.
    pub async fn find_by_id(&self, id: CategoryId) -> Result<Category, LedgerError> {
        categories::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
            .map_err(db_error)?
            .map(Category::from)
            .ok_or(LedgerError::CategoryNotFound(id))
    }

    /// Lists every category ordered by name.
    ///
    /// # Errors
    ///
    /// Returns a database error.
    pub async fn list(&self) -> Result<Vec<Category>, LedgerError> {
        let rows = categories::Entity::find()
            .order_by_asc(categories::Column::NameNorm)
            .all(&self.db)
            .await
            .map_err(db_error)?;
        Ok(rows.into_iter().map(Category::from).collect())
    }

    /// Lists categories of one type ordered by name.
    ///
    /// # Errors
    ///
    /// Returns a database error.
    pub async fn list_by_type(
        &self,
        category_type: CategoryType,
    ) -> Result<Vec<Category>, LedgerError> {
        let rows = categories::Entity::find()
            .filter(
                categories::Column::CategoryType
                    .eq(sea_orm_active_enums::CategoryType::from(category_type)),
            )
            .order_by_asc(categories::Column::NameNorm)
            .all(&self.db)
            .await
            .map_err(db_error)?;
        Ok(rows.into_iter().map(Category::from).collect())
    }

    /// Finds a category by name, ignoring case.
    ///
    /// # Errors
    ///
    /// Returns a database error.
    pub async fn find_by_name(&self, name: &str) -> Result<Option<Category>, LedgerError> {
        let row = categories::Entity::find()
            .filter(categories::Column::NameNorm.eq(normalize(name)))
            .one(&self.db)
            .await
            .map_err(db_error)?;
        Ok(row.map(Category::from))
    }

    async fn ensure_name_free(&self, category: &Category) -> Result<(), LedgerError> {
        match self.find_by_name(&category.name).await? {
            Some(existing) if existing.id != category.id => {
                Err(LedgerError::DuplicateCategory(category.name.clone()))
            }
            _ => Ok(()),
        }
    }
}
