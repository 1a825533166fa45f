//! Account Status
//!
//! This example demonstrates an account record whose status field is
//! governed by a shared status definition.
//!
//! Key concepts:
//! - Action-keyed definition loaded from JSON
//! - `@any` and `@previous` rules
//! - Enumerated statuses via `status_enum!`
//! - A custom store standing in for a database column
//!
//! Run with: cargo run --example account_status

use modelstatus::{
    status_enum, StateName, StatusDefinition, StatusEngine, StatusStore, StoreError,
};
use std::sync::Arc;

status_enum! {
    enum AccountStatus {
        AccessPending => "access_pending",
        TcPending => "tc_pending",
        AccessDenied => "access_denied",
        Offline => "offline",
        Online => "online",
        Locked => "locked",
    }
}

const DEFINITION: &str = r#"{
    "actions": {
        "grant_access": [
            { "from": "access_pending", "to": "tc_pending" },
            { "from": "access_denied", "to": "@previous", "among": ["offline", "locked", "tc_pending"] }
        ],
        "deny_access": { "from": "@any", "to": "access_denied" },
        "accept_tc": { "from": "tc_pending", "to": "offline" },
        "log_in": { "from": "offline", "to": "online" },
        "log_out": { "from": "online", "to": "offline" },
        "lock": { "from": "offline", "to": "locked" },
        "reset_password": { "from": "locked", "to": "offline" }
    },
    "default": "access_pending",
    "groups": { "active": ["online", "offline", "locked"] }
}"#;

// Database row holding the status column
struct AccountRow {
    id: u64,
    status: Option<String>,
    updates: u32,
}

impl StatusStore for AccountRow {
    fn read_status(&self) -> Option<StateName> {
        self.status.as_deref().map(StateName::from)
    }

    fn write_status(&mut self, status: &StateName) -> Result<(), StoreError> {
        if self.id == 0 {
            return Err(StoreError::new("row has no primary key"));
        }
        self.status = Some(status.to_string());
        self.updates += 1;
        Ok(())
    }
}

fn run(account: &mut StatusEngine<AccountRow>, action: &str) {
    match account.perform(action) {
        Ok(status) => println!("  ✓ {} -> {}", action, status),
        Err(err) => println!("  ✗ {}: {}", action, err),
    }
}

fn main() {
    println!("=== Account Status Example ===\n");

    let definition = match StatusDefinition::from_json(DEFINITION) {
        Ok(definition) => Arc::new(definition),
        Err(err) => {
            eprintln!("invalid definition: {}", err);
            return;
        }
    };
    println!("States: {:?}", definition.states());
    println!("Actions: {:?}\n", definition.actions().collect::<Vec<_>>());

    let row = AccountRow {
        id: 42,
        status: None,
        updates: 0,
    };
    let mut account = match StatusEngine::attach(definition.clone(), row) {
        Ok(account) => account,
        Err(err) => {
            eprintln!("cannot attach: {}", err);
            return;
        }
    };

    println!("Scenario 1: Onboarding");
    for action in ["grant_access", "accept_tc", "log_in", "log_out"] {
        run(&mut account, action);
    }
    println!("  active: {}\n", account.is_in_group("active"));

    println!("Scenario 2: Lock and Reset");
    run(&mut account, "lock");
    println!("  locked: {}", account.is_state(&AccountStatus::Locked));
    run(&mut account, "reset_password");
    println!();

    println!("Scenario 3: Deny and Restore");
    run(&mut account, "deny_access");
    println!("  available: {:?}", account.available_actions());
    run(&mut account, "grant_access");
    println!();

    println!("Scenario 4: Illegal Action");
    run(&mut account, "accept_tc");
    if let Err(err) = account.set_status(&AccountStatus::AccessPending) {
        println!("  ✗ set_status: {}", err);
    }
    println!();

    let checkpoint = account.checkpoint();
    println!("History: {} changes", checkpoint.history.len());
    for status in AccountStatus::ALL {
        let marker = if account.is_state(status) { "*" } else { " " };
        println!("  {} {}", marker, status);
    }

    println!("\nTotal database updates: {}", account.store().updates);
}
