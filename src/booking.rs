//! Booking packages, price calculation and the order form.

use serde::Serialize;
use thiserror::Error;

/// Base package price in EUR
pub const PRICE_BASE: u32 = 75;
/// Print upgrade price in EUR
pub const PRICE_PRINT: u32 = 45;
/// Premium upgrade price in EUR
pub const PRICE_PREMIUM: u32 = 35;

/// A package or upgrade as offered in the booking dialog
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Package {
    pub name: &'static str,
    pub summary: &'static str,
    pub price: u32,
    /// Contents listed under the package (upgrades: only while selected)
    pub details: &'static [&'static str],
}

pub const BASE_PACKAGE: Package = Package {
    name: "Base package",
    summary: "Always included",
    price: PRICE_BASE,
    details: &[
        "All digital copies of the photos",
        "Unlimited downloads",
        "Instant availability",
        "Accessories",
    ],
};

pub const PRINT_UPGRADE: Package = Package {
    name: "Print upgrade",
    summary: "100 photos + props",
    price: PRICE_PRINT,
    details: &[],
};

pub const PREMIUM_UPGRADE: Package = Package {
    name: "Premium upgrade",
    summary: "Extended accessories + photo book",
    price: PRICE_PREMIUM,
    details: &[
        "High-quality props",
        "Premium accessories",
        "Exclusive designs",
        "High-resolution digital download",
        "High-quality photo book (20 pages)",
    ],
};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum OrderError {
    #[error("Please enter your name")]
    MissingName,
    #[error("Please enter a valid e-mail address")]
    InvalidEmail,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upgrade {
    Print,
    Premium,
}

impl Upgrade {
    pub fn package(self) -> &'static Package {
        match self {
            Upgrade::Print => &PRINT_UPGRADE,
            Upgrade::Premium => &PREMIUM_UPGRADE,
        }
    }
}

/// Selected upgrades
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BookingOptions {
    pub print_option: bool,
    pub premium_option: bool,
}

impl BookingOptions {
    pub fn toggle(&mut self, upgrade: Upgrade) {
        match upgrade {
            Upgrade::Print => self.print_option = !self.print_option,
            Upgrade::Premium => self.premium_option = !self.premium_option,
        }
    }

    pub fn is_selected(&self, upgrade: Upgrade) -> bool {
        match upgrade {
            Upgrade::Print => self.print_option,
            Upgrade::Premium => self.premium_option,
        }
    }

    pub fn total(&self) -> u32 {
        self.line_items().iter().map(|(_, price)| price).sum()
    }

    /// Summary lines, base package first
    pub fn line_items(&self) -> Vec<(&'static str, u32)> {
        let mut items = vec![(BASE_PACKAGE.name, BASE_PACKAGE.price)];
        for upgrade in [Upgrade::Print, Upgrade::Premium] {
            if self.is_selected(upgrade) {
                let package = upgrade.package();
                items.push((package.name, package.price));
            }
        }
        items
    }

    /// Detail lines to show under an upgrade; empty while it is not selected
    pub fn visible_details(&self, upgrade: Upgrade) -> &'static [&'static str] {
        if self.is_selected(upgrade) {
            upgrade.package().details
        } else {
            &[]
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactField {
    Name,
    Email,
    Phone,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ContactInfo {
    pub name: String,
    pub email: String,
    pub phone: String,
}

impl ContactInfo {
    pub fn set(&mut self, field: ContactField, value: &str) {
        let slot = match field {
            ContactField::Name => &mut self.name,
            ContactField::Email => &mut self.email,
            ContactField::Phone => &mut self.phone,
        };
        *slot = value.to_string();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderStep {
    #[default]
    Options,
    Contact,
}

/// A submitted order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Order {
    pub options: BookingOptions,
    pub contact: ContactInfo,
    pub total_price: u32,
}

/// State of the order dialog; lives only as long as the dialog
#[derive(Debug, Clone, Default)]
pub struct OrderForm {
    pub options: BookingOptions,
    pub contact: ContactInfo,
    pub step: OrderStep,
}

impl OrderForm {
    pub fn proceed(&mut self) {
        self.step = OrderStep::Contact;
    }

    pub fn back(&mut self) {
        self.step = OrderStep::Options;
    }

    /// Validate and produce the order. There is no backend; the caller
    /// logs it.
    pub fn submit(&self) -> Result<Order, OrderError> {
        if self.contact.name.trim().is_empty() {
            return Err(OrderError::MissingName);
        }
        if !self.contact.email.contains('@') {
            return Err(OrderError::InvalidEmail);
        }

        let order = Order {
            options: self.options,
            contact: self.contact.clone(),
            total_price: self.options.total(),
        };
        match serde_json::to_string(&order) {
            Ok(json) => log::info!("Order placed: {}", json),
            Err(e) => log::warn!("Order placed (unserializable: {})", e),
        }
        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_totals() {
        let mut options = BookingOptions::default();
        assert_eq!(options.total(), 75);

        options.toggle(Upgrade::Print);
        assert_eq!(options.total(), 120);

        options.toggle(Upgrade::Premium);
        assert_eq!(options.total(), 155);

        options.toggle(Upgrade::Print);
        assert_eq!(options.total(), 110);
        assert_eq!(
            options.line_items(),
            vec![("Base package", 75), ("Premium upgrade", 35)]
        );
    }

    #[test]
    fn test_package_contents() {
        assert_eq!(BASE_PACKAGE.details.len(), 4);
        assert!(BASE_PACKAGE.details.contains(&"Unlimited downloads"));
        assert_eq!(PRINT_UPGRADE.summary, "100 photos + props");
        assert_eq!(PREMIUM_UPGRADE.summary, "Extended accessories + photo book");
        assert_eq!(Upgrade::Premium.package().price, PRICE_PREMIUM);

        let mut options = BookingOptions::default();
        assert!(options.visible_details(Upgrade::Premium).is_empty());

        options.toggle(Upgrade::Premium);
        let details = options.visible_details(Upgrade::Premium);
        assert_eq!(details.len(), 5);
        assert_eq!(details[4], "High-quality photo book (20 pages)");
        assert!(options.visible_details(Upgrade::Print).is_empty());
        assert_eq!(
            options.line_items(),
            vec![("Base package", PRICE_BASE), ("Premium upgrade", PRICE_PREMIUM)]
        );
    }

    #[test]
    fn test_order_flow() {
        let mut form = OrderForm::default();
        assert_eq!(form.step, OrderStep::Options);
        form.options.toggle(Upgrade::Print);
        form.proceed();
        assert_eq!(form.step, OrderStep::Contact);

        assert_eq!(form.submit(), Err(OrderError::MissingName));

        form.contact.set(ContactField::Name, "Erika Mustermann");
        form.contact.set(ContactField::Email, "erika.example.de");
        assert_eq!(form.submit(), Err(OrderError::InvalidEmail));

        form.contact.set(ContactField::Email, "erika@example.de");
        form.contact.set(ContactField::Phone, "0123 456");
        let order = form.submit().unwrap();
        assert_eq!(order.total_price, 120);
        assert_eq!(order.contact.phone, "0123 456");

        // Going back keeps the entered data
        form.back();
        assert_eq!(form.step, OrderStep::Options);
        assert_eq!(form.contact.name, "Erika Mustermann");
    }
}
