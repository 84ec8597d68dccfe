/// Relational shape of the store, declared idempotently. Executed on every
/// launch; existing tables are never an error, and a pre-existing table with
/// drifted columns is not detected here — consumers must not assume schema
/// compatibility beyond the columns named below.
pub const CURRENT_SCHEMA: &str = r#"
PRAGMA foreign_keys = 1;

CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY,
    username TEXT NOT NULL UNIQUE,
    role TEXT NOT NULL,
    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
);

CREATE TABLE IF NOT EXISTS child_profiles (
    id INTEGER PRIMARY KEY,
    user_id INTEGER,
    parent_id INTEGER,
    name TEXT NOT NULL,
    age INTEGER NOT NULL DEFAULT 0,
    gender TEXT NOT NULL DEFAULT 'girl',
    avatar_index INTEGER NOT NULL DEFAULT 0,
    FOREIGN KEY (user_id) REFERENCES users (id),
    FOREIGN KEY (parent_id) REFERENCES users (id)
);

CREATE TABLE IF NOT EXISTS parent_profiles (
    id INTEGER PRIMARY KEY,
    user_id INTEGER NOT NULL,
    name TEXT NOT NULL,
    phone TEXT,
    FOREIGN KEY (user_id) REFERENCES users (id)
);

CREATE TABLE IF NOT EXISTS teacher_profiles (
    id INTEGER PRIMARY KEY,
    user_id INTEGER NOT NULL,
    name TEXT NOT NULL,
    school_name TEXT,
    FOREIGN KEY (user_id) REFERENCES users (id)
);

CREATE TABLE IF NOT EXISTS schools (
    id INTEGER PRIMARY KEY,
    caretaker_id INTEGER NOT NULL,
    name TEXT NOT NULL,
    kind TEXT NOT NULL DEFAULT 'girls',
    activity_days TEXT NOT NULL DEFAULT '[]',
    FOREIGN KEY (caretaker_id) REFERENCES users (id)
);

CREATE TABLE IF NOT EXISTS students (
    id INTEGER PRIMARY KEY,
    school_id INTEGER NOT NULL,
    name TEXT NOT NULL,
    age INTEGER NOT NULL DEFAULT 0,
    grade INTEGER NOT NULL DEFAULT 0,
    FOREIGN KEY (school_id) REFERENCES schools (id)
);

CREATE TABLE IF NOT EXISTS health_records (
    id INTEGER PRIMARY KEY,
    student_id INTEGER NOT NULL,
    date DATE NOT NULL,
    has_brushed BOOLEAN NOT NULL DEFAULT FALSE,
    has_cavity BOOLEAN NOT NULL DEFAULT FALSE,
    has_healthy_gums BOOLEAN NOT NULL DEFAULT TRUE,
    score INTEGER NOT NULL DEFAULT 5,
    notes TEXT NOT NULL DEFAULT '',
    warning_flags TEXT NOT NULL DEFAULT '{}',
    needs_referral BOOLEAN NOT NULL DEFAULT FALSE,
    referral_notes TEXT NOT NULL DEFAULT '',
    resolved BOOLEAN NOT NULL DEFAULT FALSE,
    FOREIGN KEY (student_id) REFERENCES students (id)
);

CREATE TABLE IF NOT EXISTS reminders (
    id INTEGER PRIMARY KEY,
    user_id INTEGER NOT NULL,
    kind TEXT NOT NULL,
    time TEXT NOT NULL,
    message TEXT NOT NULL DEFAULT '',
    enabled BOOLEAN NOT NULL DEFAULT TRUE,
    UNIQUE (user_id, kind),
    FOREIGN KEY (user_id) REFERENCES users (id)
);

CREATE TABLE IF NOT EXISTS brushing_records (
    id INTEGER PRIMARY KEY,
    child_id INTEGER NOT NULL,
    date DATE NOT NULL,
    time_of_day TEXT NOT NULL DEFAULT 'morning',
    duration_seconds INTEGER NOT NULL DEFAULT 0,
    completed BOOLEAN NOT NULL DEFAULT FALSE,
    FOREIGN KEY (child_id) REFERENCES child_profiles (id)
);

CREATE TABLE IF NOT EXISTS achievements (
    owner_id INTEGER NOT NULL,
    kind TEXT NOT NULL,
    value INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (owner_id, kind)
);

CREATE TABLE IF NOT EXISTS survey_responses (
    id INTEGER PRIMARY KEY,
    parent_id INTEGER NOT NULL,
    child_name TEXT NOT NULL DEFAULT '',
    submitted_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
    brushing_frequency TEXT NOT NULL DEFAULT '',
    supervises_brushing BOOLEAN NOT NULL DEFAULT FALSE,
    sweets_frequency TEXT NOT NULL DEFAULT '',
    has_seen_dentist BOOLEAN NOT NULL DEFAULT FALSE,
    uses_fluoride BOOLEAN NOT NULL DEFAULT FALSE,
    FOREIGN KEY (parent_id) REFERENCES users (id)
);
"#;
