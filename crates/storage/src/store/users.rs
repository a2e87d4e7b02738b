#![forbid(unsafe_code)]

use super::support::{REGISTERED_USERS_COUNTER, next_counter_tx, read_counter_tx};
use super::*;
use rusqlite::{OptionalExtension, Row, TransactionBehavior, params};
use vt_core::policy::first_user_is_admin;
use vt_core::{Principal, PrincipalId, Tier};

const USER_COLUMNS: &str = "id, email, name, picture, password_hash, tier, is_blocked, is_admin";

impl SqliteStore {
    /// Inserts a new principal and decides its admin bit.
    ///
    /// The registration counter is read and bumped inside the same IMMEDIATE transaction as the
    /// insert, so two concurrent first registrations cannot both become admin. The counter never
    /// decreases: deleting the first user does not make the next one an admin.
    pub fn insert_user(&mut self, user: NewUser) -> Result<Principal, StoreError> {
        let NewUser {
            id,
            email,
            name,
            picture,
            password_hash,
            tier,
            grant,
            created_at_ms,
        } = user;

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let email_taken = tx
            .query_row(
                "SELECT 1 FROM users WHERE email=?1",
                params![email],
                |row| row.get::<_, i64>(0),
            )
            .optional()?
            .is_some();
        if email_taken {
            return Err(StoreError::DuplicateEmail);
        }

        let registered = to_u64(
            read_counter_tx(&tx, REGISTERED_USERS_COUNTER)?,
            "counters.registered_users",
        )?;
        let is_admin = match grant {
            AdminGrant::FirstUserOnly => first_user_is_admin(registered),
            AdminGrant::Operator => true,
        };

        tx.execute(
            r#"
            INSERT INTO users(id, email, name, picture, password_hash, tier, is_blocked, is_admin, created_at_ms)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, ?7, ?8)
            "#,
            params![
                id.as_str(),
                email,
                name,
                picture,
                password_hash,
                tier.as_str(),
                is_admin,
                created_at_ms,
            ],
        )
        .map_err(|err| {
            if is_constraint_violation(&err) {
                StoreError::InvalidInput("user id already exists")
            } else {
                StoreError::Sql(err)
            }
        })?;
        next_counter_tx(&tx, REGISTERED_USERS_COUNTER)?;
        tx.commit()?;

        if is_admin {
            tracing::info!(user_id = %id, "admin principal created");
        }

        Ok(Principal {
            id,
            email,
            name,
            picture,
            password_hash,
            tier,
            is_blocked: false,
            is_admin,
        })
    }

    pub fn get_user(&self, id: &PrincipalId) -> Result<Option<Principal>, StoreError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id=?1");
        self.query_one_user(&sql, id.as_str())
    }

    pub fn find_user_by_email(&self, email: &str) -> Result<Option<Principal>, StoreError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email=?1");
        self.query_one_user(&sql, email)
    }

    /// All principals in registration order.
    pub fn list_users(&self) -> Result<Vec<Principal>, StoreError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY rowid ASC");
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query([])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            out.push(principal_from_row(row)?);
        }
        Ok(out)
    }

    pub fn count_users(&self) -> Result<u64, StoreError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(1) FROM users", [], |row| row.get(0))?;
        to_u64(count, "users count")
    }

    /// Number of principals ever created, including deleted ones.
    pub fn registered_user_count(&self) -> Result<u64, StoreError> {
        let value: Option<i64> = self
            .conn
            .query_row(
                "SELECT value FROM counters WHERE name=?1",
                params![REGISTERED_USERS_COUNTER],
                |row| row.get(0),
            )
            .optional()?;
        to_u64(value.unwrap_or(0), "counters.registered_users")
    }

    pub fn set_tier(&mut self, id: &PrincipalId, tier: Tier) -> Result<Principal, StoreError> {
        let changed = self.conn.execute(
            "UPDATE users SET tier=?2 WHERE id=?1",
            params![id.as_str(), tier.as_str()],
        )?;
        if changed == 0 {
            return Err(StoreError::UnknownId);
        }
        self.get_user(id)?.ok_or(StoreError::UnknownId)
    }

    pub fn set_blocked(
        &mut self,
        id: &PrincipalId,
        blocked: bool,
    ) -> Result<Principal, StoreError> {
        let changed = self.conn.execute(
            "UPDATE users SET is_blocked=?2 WHERE id=?1",
            params![id.as_str(), blocked],
        )?;
        if changed == 0 {
            return Err(StoreError::UnknownId);
        }
        self.get_user(id)?.ok_or(StoreError::UnknownId)
    }

    pub fn update_profile(
        &mut self,
        id: &PrincipalId,
        update: ProfileUpdate,
    ) -> Result<Principal, StoreError> {
        let ProfileUpdate {
            email,
            name,
            picture,
        } = update;

        let tx = self.conn.transaction()?;
        let email_owner = tx
            .query_row(
                "SELECT id FROM users WHERE email=?1",
                params![email],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        if email_owner.is_some_and(|owner| owner != id.as_str()) {
            return Err(StoreError::DuplicateEmail);
        }

        let changed = tx.execute(
            "UPDATE users SET email=?2, name=?3, picture=?4 WHERE id=?1",
            params![id.as_str(), email, name, picture],
        )?;
        if changed == 0 {
            return Err(StoreError::UnknownId);
        }
        tx.commit()?;

        self.get_user(id)?.ok_or(StoreError::UnknownId)
    }

    /// Removes the account row. Tasks are not cascaded; a user who still owns tasks cannot be
    /// removed until the caller deletes them.
    pub fn delete_user(&mut self, id: &PrincipalId) -> Result<(), StoreError> {
        let changed = self
            .conn
            .execute("DELETE FROM users WHERE id=?1", params![id.as_str()])
            .map_err(|err| {
                if is_constraint_violation(&err) {
                    StoreError::InvalidInput("user still owns tasks")
                } else {
                    StoreError::Sql(err)
                }
            })?;
        if changed == 0 {
            return Err(StoreError::UnknownId);
        }
        Ok(())
    }

    fn query_one_user(&self, sql: &str, key: &str) -> Result<Option<Principal>, StoreError> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params![key])?;
        let principal = match rows.next()? {
            Some(row) => Some(principal_from_row(row)?),
            None => None,
        };
        Ok(principal)
    }
}

fn principal_from_row(row: &Row<'_>) -> Result<Principal, StoreError> {
    let id = PrincipalId::try_new(row.get::<_, String>(0)?)
        .map_err(|_| StoreError::CorruptRow("users.id"))?;
    let tier_raw: String = row.get(5)?;
    let tier = Tier::parse(&tier_raw).ok_or(StoreError::CorruptRow("users.tier"))?;

    Ok(Principal {
        id,
        email: row.get(1)?,
        name: row.get(2)?,
        picture: row.get(3)?,
        password_hash: row.get(4)?,
        tier,
        is_blocked: row.get(6)?,
        is_admin: row.get(7)?,
    })
}
