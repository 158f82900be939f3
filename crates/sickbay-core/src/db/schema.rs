//! SQLite schema definition.

/// Complete database schema for the sickbay.
pub const SCHEMA: &str = r#"
-- Enable foreign keys
PRAGMA foreign_keys = ON;

-- ============================================================================
-- Students (opaque, owned by the school records system)
-- ============================================================================

CREATE TABLE IF NOT EXISTS students (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    house TEXT,
    class TEXT
);

CREATE INDEX IF NOT EXISTS idx_students_name ON students(name);

-- ============================================================================
-- Prescriptions (never deleted, audit trail)
-- ============================================================================

CREATE TABLE IF NOT EXISTS prescriptions (
    id TEXT PRIMARY KEY,
    student_id TEXT NOT NULL REFERENCES students(id),
    student_name TEXT NOT NULL,                  -- denormalized for display
    drug_name TEXT NOT NULL,
    dosage TEXT NOT NULL,                        -- e.g. "2x3"
    duration_days INTEGER NOT NULL CHECK (duration_days >= 1),
    notes TEXT,
    status TEXT NOT NULL DEFAULT 'active' CHECK (status IN ('active', 'completed')),
    progress INTEGER NOT NULL DEFAULT 0 CHECK (progress BETWEEN 0 AND 100),
    taken_doses INTEGER NOT NULL DEFAULT 0,
    total_doses INTEGER NOT NULL DEFAULT 0,
    start_date TEXT NOT NULL,                    -- YYYY-MM-DD
    created_at TEXT NOT NULL,
    started_at TEXT NOT NULL,
    completed_at TEXT,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_prescriptions_student ON prescriptions(student_id);
CREATE INDEX IF NOT EXISTS idx_prescriptions_status ON prescriptions(status);

-- ============================================================================
-- Dose Records (one per prescription/date/slot; pending -> taken | missed)
-- ============================================================================

CREATE TABLE IF NOT EXISTS dose_records (
    id TEXT PRIMARY KEY,
    prescription_id TEXT NOT NULL REFERENCES prescriptions(id),
    student_id TEXT NOT NULL,
    student_name TEXT NOT NULL,                  -- denormalized for display
    drug_name TEXT NOT NULL,                     -- denormalized for display
    scheduled_date TEXT NOT NULL,                -- YYYY-MM-DD
    time_slot TEXT NOT NULL CHECK (time_slot IN ('morning', 'midday', 'evening')),
    status TEXT NOT NULL DEFAULT 'pending' CHECK (status IN ('pending', 'taken', 'missed')),
    notes TEXT,
    recorded_by TEXT,
    created_at TEXT NOT NULL,
    taken_at TEXT,
    missed_at TEXT,
    updated_at TEXT NOT NULL,
    UNIQUE (prescription_id, scheduled_date, time_slot)
);

CREATE INDEX IF NOT EXISTS idx_doses_prescription ON dose_records(prescription_id);
CREATE INDEX IF NOT EXISTS idx_doses_date_slot_status ON dose_records(scheduled_date, time_slot, status);

-- Terminal statuses are final
CREATE TRIGGER IF NOT EXISTS dose_records_terminal BEFORE UPDATE OF status ON dose_records
WHEN old.status <> 'pending'
BEGIN
    SELECT RAISE(ABORT, 'Dose record already processed');
END;

-- ============================================================================
-- Stock
-- ============================================================================

CREATE TABLE IF NOT EXISTS stocks (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL UNIQUE COLLATE NOCASE,
    category TEXT,
    quantity INTEGER NOT NULL CHECK (quantity >= 0),
    unit TEXT NOT NULL DEFAULT 'units',
    unit_price REAL NOT NULL DEFAULT 0,
    low_stock_threshold INTEGER NOT NULL DEFAULT 20,
    expiry_date TEXT,                            -- YYYY-MM-DD
    supplier TEXT,
    description TEXT,
    added_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
"#;
