use anyhow::Result;
use rusqlite::{Connection, params};
use tracing::{info, warn};

// (username, password, email, first, last, role)
const USERS: &[(&str, &str, &str, &str, &str, &str)] = &[
    ("sarah.connor", "Welcome123!", "sarah.connor@globomantics.com", "Sarah", "Connor", "admin"),
    ("john.doe", "Password2024", "john.doe@globomantics.com", "John", "Doe", "manager"),
    ("mary.smith", "Secure456", "mary.smith@globomantics.com", "Mary", "Smith", "user"),
    ("admin", "GlobalAdmin2024", "admin@globomantics.com", "System", "Administrator", "admin"),
    ("demo", "Demo2024!", "demo@globomantics.com", "Demo", "User", "user"),
];

// (first, last, email, phone, company, status)
const CUSTOMERS: &[(&str, &str, &str, &str, &str, &str)] = &[
    ("Alice", "Johnson", "alice.johnson@techcorp.com", "555-0101", "TechCorp Industries", "active"),
    ("Bob", "Williams", "bob.williams@innovatetech.com", "555-0102", "InnovateTech Solutions", "active"),
    ("Carol", "Davis", "carol.davis@digitalsolutions.com", "555-0103", "Digital Solutions LLC", "active"),
    ("David", "Brown", "david.brown@startupventures.com", "555-0104", "Startup Ventures", "prospect"),
    ("Eva", "Miller", "eva.miller@futuretech.com", "555-0105", "FutureTech Corp", "active"),
];

// (amount, vendor email, description)
const PAYMENTS: &[(f64, &str, &str)] = &[
    (15750.00, "accounting@techcorp.com", "Q4 Software License Renewal - Enterprise Package"),
    (8250.50, "billing@innovatetech.com", "Consulting Services - System Integration Project"),
    (12000.75, "payments@digitalsolutions.com", "Hardware Procurement - Server Infrastructure"),
    (6500.00, "finance@startupventures.com", "Training and Certification Program"),
    (22300.25, "procurement@futuretech.com", "Custom Development - CRM Module Enhancement"),
];

// (id, customer_id, user_id, type, subject, notes)
const ACTIVITIES: &[(i64, i64, i64, &str, &str, &str)] = &[
    (1, 1, 1, "call", "Initial consultation call", "Discussed requirements for new CRM system"),
    (2, 2, 2, "email", "Follow-up proposal", "Sent detailed proposal for integration services"),
    (3, 3, 1, "meeting", "Project kickoff meeting", "Met with stakeholders to discuss project timeline"),
    (4, 4, 3, "call", "Discovery call", "Initial needs assessment for potential client"),
    (5, 5, 2, "demo", "Product demonstration", "Showcased CRM features and capabilities"),
];

// (id, username, content, message_type)
const COMMENTS: &[(i64, &str, &str, &str)] = &[
    (1, "sarah.connor", "Welcome to the team chat! Please use this for internal communications.", "announcement"),
    (2, "john.doe", "Great work on the Q4 sales numbers everyone!", "general"),
    (3, "mary.smith", "Don't forget about the client meeting tomorrow at 2 PM.", "reminder"),
];

/// Insert the demo data set. Safe to run on every start.
pub fn run(conn: &Connection) -> Result<()> {
    for (username, password, email, first, last, role) in USERS {
        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM users WHERE username = ?1)",
            [username],
            |row| row.get(0),
        )?;
        if !exists {
            if let Err(e) = conn.execute(
                "INSERT INTO users (username, password, email, first_name, last_name, role)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![username, password, email, first, last, role],
            ) {
                warn!("Error inserting user {}: {}", username, e);
            }
        }
    }

    for (first, last, email, phone, company, status) in CUSTOMERS {
        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM customers WHERE email = ?1)",
            [email],
            |row| row.get(0),
        )?;
        if !exists {
            if let Err(e) = conn.execute(
                "INSERT INTO customers (first_name, last_name, email, phone, company, status)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![first, last, email, phone, company, status],
            ) {
                warn!("Error inserting customer {}: {}", email, e);
            }
        }
    }

    for (amount, email, description) in PAYMENTS {
        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM payments WHERE amount = ?1 AND email = ?2)",
            params![amount, email],
            |row| row.get(0),
        )?;
        if !exists {
            if let Err(e) = conn.execute(
                "INSERT INTO payments (amount, email, description) VALUES (?1, ?2, ?3)",
                params![amount, email, description],
            ) {
                warn!("Error inserting payment for {}: {}", email, e);
            }
        }
    }

    for (id, customer_id, user_id, kind, subject, notes) in ACTIVITIES {
        if let Err(e) = conn.execute(
            "INSERT OR IGNORE INTO activities (id, customer_id, user_id, type, subject, notes)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![id, customer_id, user_id, kind, subject, notes],
        ) {
            warn!("Error inserting activity {}: {}", id, e);
        }
    }

    for (id, username, content, message_type) in COMMENTS {
        if let Err(e) = conn.execute(
            "INSERT OR IGNORE INTO comments (id, username, content, message_type)
             VALUES (?1, ?2, ?3, ?4)",
            params![id, username, content, message_type],
        ) {
            warn!("Error inserting comment {}: {}", id, e);
        }
    }

    info!("Sample data ready");
    Ok(())
}
