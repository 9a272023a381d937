use sea_orm::{
    ActiveValue, Condition, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
    sea_query::LikeExpr,
};

use crate::{
    Category, DateWindow, EngineError, Expense, ExpenseInput, ResultEngine, expenses,
};

use super::{Engine, with_tx};

/// Unscoped expense query used by the admin console.
#[derive(Clone, Debug, Default)]
pub struct ExpenseSearch {
    /// Only expenses owned by this user.
    pub user_id: Option<String>,
    pub category: Option<Category>,
    /// Case-insensitive match against description or category slug.
    pub text: Option<String>,
    pub window: Option<DateWindow>,
}

fn not_found(id: i32) -> EngineError {
    EngineError::KeyNotFound(format!("expense {id}"))
}

/// `%text%` with `%`, `_` and `\` in `text` matched literally.
fn contains_pattern(text: &str) -> LikeExpr {
    let mut pattern = String::with_capacity(text.len() + 2);
    pattern.push('%');
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    LikeExpr::new(pattern).escape('\\')
}

fn into_expenses(models: Vec<expenses::Model>) -> ResultEngine<Vec<Expense>> {
    models.into_iter().map(Expense::try_from).collect()
}

impl Engine {
    /// Validates `input` and stores it as a new expense owned by `user_id`.
    ///
    /// Nothing is written when validation fails; the error carries every
    /// field message.
    pub async fn create_expense(
        &self,
        user_id: &str,
        input: ExpenseInput<'_>,
    ) -> ResultEngine<Expense> {
        let draft = input.validate()?;

        let mut active = expenses::ActiveModel {
            id: ActiveValue::NotSet,
            user_id: ActiveValue::Set(user_id.to_string()),
            ..Default::default()
        };
        active.apply_draft(&draft);
        let model = active.insert(&self.database).await?;

        Expense::try_from(model)
    }

    /// Lists the expenses of `user_id`, newest date first.
    ///
    /// When `window` is given only expenses dated inside it (inclusive) are
    /// returned.
    pub async fn list_expenses(
        &self,
        user_id: &str,
        window: Option<DateWindow>,
    ) -> ResultEngine<Vec<Expense>> {
        let mut query = expenses::Entity::find().filter(expenses::Column::UserId.eq(user_id));
        if let Some(window) = window {
            query = query
                .filter(expenses::Column::Date.gte(window.start))
                .filter(expenses::Column::Date.lte(window.end));
        }

        let models = query
            .order_by_desc(expenses::Column::Date)
            .order_by_desc(expenses::Column::Id)
            .all(&self.database)
            .await?;
        into_expenses(models)
    }

    /// Loads one expense. Expenses of other users are reported as not found.
    pub async fn expense(&self, user_id: &str, id: i32) -> ResultEngine<Expense> {
        let model = self.find_owned(&self.database, user_id, id).await?;
        Expense::try_from(model)
    }

    /// Overwrites an existing expense with a validated form.
    pub async fn update_expense(
        &self,
        user_id: &str,
        id: i32,
        input: ExpenseInput<'_>,
    ) -> ResultEngine<Expense> {
        with_tx!(self, |db_tx| {
            let model = self.find_owned(&db_tx, user_id, id).await?;
            match input.validate() {
                Ok(draft) => {
                    let mut active: expenses::ActiveModel = model.into();
                    active.apply_draft(&draft);
                    let updated = active.update(&db_tx).await?;
                    Expense::try_from(updated)
                }
                Err(errors) => Err(EngineError::Validation(errors)),
            }
        })
    }

    /// Removes an expense. Missing ids are an error, not a silent success.
    pub async fn delete_expense(&self, user_id: &str, id: i32) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let model = self.find_owned(&db_tx, user_id, id).await?;
            expenses::Entity::delete_by_id(model.id)
                .exec(&db_tx)
                .await
                .map(|_| ())
                .map_err(EngineError::from)
        })
    }

    /// Searches every user's expenses, newest date first.
    pub async fn search_expenses(&self, search: &ExpenseSearch) -> ResultEngine<Vec<Expense>> {
        let mut query = expenses::Entity::find();
        if let Some(user_id) = &search.user_id {
            query = query.filter(expenses::Column::UserId.eq(user_id.as_str()));
        }
        if let Some(category) = search.category {
            query = query.filter(expenses::Column::Category.eq(category.slug()));
        }
        if let Some(text) = search.text.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            query = query.filter(
                Condition::any()
                    .add(expenses::Column::Description.like(contains_pattern(text)))
                    .add(expenses::Column::Category.like(contains_pattern(text))),
            );
        }
        if let Some(window) = search.window {
            query = query
                .filter(expenses::Column::Date.gte(window.start))
                .filter(expenses::Column::Date.lte(window.end));
        }

        let models = query
            .order_by_desc(expenses::Column::Date)
            .order_by_desc(expenses::Column::Id)
            .all(&self.database)
            .await?;
        into_expenses(models)
    }

    /// Deletes any expense by id, regardless of owner.
    pub async fn admin_delete_expense(&self, id: i32) -> ResultEngine<()> {
        let result = expenses::Entity::delete_by_id(id)
            .exec(&self.database)
            .await?;
        if result.rows_affected == 0 {
            return Err(not_found(id));
        }
        Ok(())
    }

    async fn find_owned<C: ConnectionTrait>(
        &self,
        db: &C,
        user_id: &str,
        id: i32,
    ) -> ResultEngine<expenses::Model> {
        expenses::Entity::find_by_id(id)
            .filter(expenses::Column::UserId.eq(user_id))
            .one(db)
            .await?
            .ok_or_else(|| not_found(id))
    }
}
