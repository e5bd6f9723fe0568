//! Customer entity

use chrono::{Datelike, Local, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::domain::Identity;
use crate::domain::warehouse::Order;

/// A registered customer and the orders they placed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: Identity,
    pub name: String,
    pub birth_date: NaiveDate,
    pub orders: Vec<Order>,
}

impl Customer {
    /// Create an unpersisted customer with no orders
    pub fn new(name: impl Into<String>, birth_date: NaiveDate) -> Self {
        Self {
            id: Identity::Unassigned,
            name: name.into(),
            birth_date,
            orders: Vec::new(),
        }
    }

    /// Age in full years as of `today`
    ///
    /// One year less until this year's birthday has been reached. Negative
    /// spans (a birth date after `today`) count as zero.
    pub fn age_on(&self, today: NaiveDate) -> u32 {
        let mut years = today.year() - self.birth_date.year();
        if (today.month(), today.day()) < (self.birth_date.month(), self.birth_date.day()) {
            years -= 1;
        }
        years.max(0) as u32
    }

    /// Age in full years as of the local current date
    pub fn age(&self) -> u32 {
        self.age_on(Local::now().date_naive())
    }

    pub fn place_order(&mut self, order: Order) {
        self.orders.push(order);
    }
}
