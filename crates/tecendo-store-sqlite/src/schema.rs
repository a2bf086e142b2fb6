//! SQL schema for the Tecendo Arte SQLite store.
//!
//! Run in full every time a store is opened. Each statement is idempotent,
//! so reopening an existing file leaves its rows untouched.
//!
//! No `ON DELETE` actions are declared. Dependent rows are removed explicitly
//! by the identity manager, and the foreign keys make any other deletion
//! order fail.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS accounts (
    account_id    TEXT PRIMARY KEY,
    email         TEXT NOT NULL,          -- as entered
    email_key     TEXT NOT NULL UNIQUE,   -- trimmed, lowercased
    password_hash TEXT NOT NULL,
    display_name  TEXT NOT NULL,
    account_type  TEXT NOT NULL,          -- 'donor' | 'creator' | 'admin'
    created_at    TEXT NOT NULL,
    updated_at    TEXT NOT NULL,
    CHECK (updated_at >= created_at)
);

-- At most one profile per account; the variant is the `kind` column.
CREATE TABLE IF NOT EXISTS profiles (
    profile_id  TEXT PRIMARY KEY,
    account_id  TEXT NOT NULL UNIQUE REFERENCES accounts(account_id),
    kind        TEXT NOT NULL,            -- 'donor' | 'creator'
    bio         TEXT,                     -- creator only
    categories  TEXT NOT NULL DEFAULT '[]' -- JSON; donor interests or creator categories
);

CREATE TABLE IF NOT EXISTS profile_projects (
    profile_id  TEXT NOT NULL REFERENCES profiles(profile_id),
    position    INTEGER NOT NULL,
    project_id  TEXT NOT NULL UNIQUE,
    title       TEXT NOT NULL,
    description TEXT NOT NULL,
    category    TEXT NOT NULL,            -- one of the profile category names
    PRIMARY KEY (profile_id, position)
);

-- Reports are never deleted. `author_account_id` is not a
-- foreign key: reports outlive their author's account.
CREATE TABLE IF NOT EXISTS reports (
    report_id         TEXT PRIMARY KEY,
    reported_kind     TEXT NOT NULL,      -- 'project' | 'user' | 'artist'
    target_id         TEXT NOT NULL,
    description       TEXT NOT NULL,
    author_account_id TEXT NOT NULL,
    status            TEXT NOT NULL,      -- 'pending' | 'upheld' | 'dismissed'
    created_at        TEXT NOT NULL,
    updated_at        TEXT NOT NULL,
    CHECK (length(trim(description)) > 0),
    CHECK (updated_at >= created_at)
);

CREATE INDEX IF NOT EXISTS accounts_type_idx   ON accounts(account_type);
CREATE INDEX IF NOT EXISTS reports_status_idx  ON reports(status);
CREATE INDEX IF NOT EXISTS reports_created_idx ON reports(created_at);

PRAGMA user_version = 1;
";
