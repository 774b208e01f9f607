use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{OrdrinError, Result};
use crate::validation::Validation;

/// One menu item with its quantity and chosen option ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrayItem {
    pub item_id: u64,
    pub quantity: u32,
    #[serde(default)]
    pub options: Vec<u64>,
}

impl TrayItem {
    pub fn new(item_id: u64, quantity: u32) -> Self {
        Self {
            item_id,
            quantity,
            options: Vec::new(),
        }
    }

    pub fn with_options(mut self, options: impl IntoIterator<Item = u64>) -> Self {
        self.options = options.into_iter().collect();
        self
    }

    pub fn validate(&self) -> Result<()> {
        let mut v = Validation::new("Tray Item");
        self.check(&mut v);
        v.finish()
    }

    fn check(&self, v: &mut Validation) {
        let mut local = Validation::new("Tray Item");
        if self.item_id == 0 {
            local.invalid("Item ID", "must be a positive integer", "0");
        }
        if self.quantity == 0 {
            local.invalid("Quantity", "must be at least 1", "0");
        }
        if self.options.contains(&0) {
            local.invalid("Option ID", "must be a positive integer", "0");
        }
        v.absorb(local.finish());
    }

    /// `id/qty` followed by `,option` for each option.
    pub fn to_wire(&self) -> String {
        let mut wire = format!("{}/{}", self.item_id, self.quantity);
        for option in &self.options {
            wire.push(',');
            wire.push_str(&option.to_string());
        }
        wire
    }
}

/// The items of one order, in the order they were added.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tray {
    items: Vec<TrayItem>,
}

impl Tray {
    pub fn new(items: Vec<TrayItem>) -> Self {
        Self { items }
    }

    /// Parse the `id/qty[,opt]*(+id/qty[,opt]*)*` string form.
    pub fn parse(raw: &str) -> Result<Self> {
        let mut v = Validation::new("Tray");
        v.tray_items(raw);
        v.finish()?;

        let items = raw
            .split('+')
            .map(parse_item)
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| {
                OrdrinError::bad_value(format!(
                    "Tray - Validation - Items (invalid, ids out of range) ({raw})"
                ))
            })?;
        Ok(Self { items })
    }

    pub fn add(&mut self, item: TrayItem) -> &mut Self {
        self.items.push(item);
        self
    }

    pub fn items(&self) -> &[TrayItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Fails for an empty tray and reports every invalid item.
    pub fn validate(&self) -> Result<()> {
        let mut v = Validation::new("Tray");
        if self.items.is_empty() {
            v.tray_items("");
        }
        for item in &self.items {
            item.check(&mut v);
        }
        v.finish()
    }

    /// Item wire forms joined by `+`.
    pub fn to_wire(&self) -> String {
        self.items
            .iter()
            .map(TrayItem::to_wire)
            .collect::<Vec<_>>()
            .join("+")
    }
}

impl FromStr for Tray {
    type Err = OrdrinError;

    fn from_str(s: &str) -> Result<Self> {
        Tray::parse(s)
    }
}

impl FromIterator<TrayItem> for Tray {
    fn from_iter<I: IntoIterator<Item = TrayItem>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

fn parse_item(segment: &str) -> Option<TrayItem> {
    let (id, rest) = segment.split_once('/')?;
    let mut parts = rest.split(',');
    let quantity = parts.next()?.parse().ok()?;
    let options = parts
        .map(str::parse)
        .collect::<std::result::Result<Vec<u64>, _>>()
        .ok()?;
    Some(TrayItem {
        item_id: id.parse().ok()?,
        quantity,
        options,
    })
}
