//! Profile database operations

use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension, Result as SqliteResult, Row, params};

use super::super::Database;
use crate::models::{UserProfile, WalletRef};

const PROFILE_COLUMNS: &str =
    "id, contact_handle, display_name, email_address, wallet_address, wallet_secret, created_at, updated_at";

fn row_to_profile(row: &Row) -> rusqlite::Result<UserProfile> {
    let created_at_str: String = row.get(6)?;
    let updated_at_str: String = row.get(7)?;

    let wallet_address: Option<String> = row.get(4)?;
    let wallet_secret: Option<String> = row.get(5)?;
    let wallet = match (wallet_address, wallet_secret) {
        (Some(address), Some(secret)) => Some(WalletRef { address, secret }),
        _ => None,
    };

    Ok(UserProfile {
        id: row.get(0)?,
        contact_handle: row.get(1)?,
        display_name: row.get(2)?,
        email_address: row.get(3)?,
        wallet,
        created_at: DateTime::parse_from_rfc3339(&created_at_str)
            .unwrap()
            .with_timezone(&Utc),
        updated_at: DateTime::parse_from_rfc3339(&updated_at_str)
            .unwrap()
            .with_timezone(&Utc),
    })
}

impl Database {
    pub fn find_profile(&self, handle: &str) -> SqliteResult<Option<UserProfile>> {
        let conn = self.conn();

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM profiles WHERE contact_handle = ?1",
            PROFILE_COLUMNS
        ))?;

        stmt.query_row([handle], row_to_profile).optional()
    }

    pub fn create_profile(
        &self,
        handle: &str,
        display_name: Option<&str>,
    ) -> SqliteResult<UserProfile> {
        let now = Utc::now().to_rfc3339();
        {
            let conn = self.conn();
            conn.execute(
                "INSERT INTO profiles (contact_handle, display_name, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?3)",
                params![handle, display_name, now],
            )?;
        }

        self.find_profile(handle)
            .map(|p| p.expect("profile just inserted"))
    }

    pub fn update_display_name(&self, handle: &str, display_name: &str) -> SqliteResult<()> {
        let conn = self.conn();
        conn.execute(
            "UPDATE profiles SET display_name = ?2, updated_at = ?3 WHERE contact_handle = ?1",
            params![handle, display_name, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    pub fn update_email_address(&self, handle: &str, email: &str) -> SqliteResult<()> {
        let conn = self.conn();
        conn.execute(
            "UPDATE profiles SET email_address = ?2, updated_at = ?3 WHERE contact_handle = ?1",
            params![handle, email, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    /// Attach wallet key material to a profile. One statement, so a
    /// concurrent reader never sees an address without its secret.
    pub fn set_wallet(&self, handle: &str, wallet: &WalletRef) -> SqliteResult<()> {
        let conn = self.conn();
        conn.execute(
            "UPDATE profiles SET wallet_address = ?2, wallet_secret = ?3, updated_at = ?4
             WHERE contact_handle = ?1",
            params![handle, wallet.address, wallet.secret, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }
}
