//! Initial database migration.
//!
//! Creates the enums, catalog tables, availability rules, bookings with their
//! overlap exclusion constraint, and the wallet and payout ledgers.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ============================================================
        // PART 1: EXTENSIONS & ENUMS
        // ============================================================
        db.execute_unprepared(EXTENSIONS_SQL).await?;
        db.execute_unprepared(ENUMS_SQL).await?;

        // ============================================================
        // PART 2: CATALOG (read-only, owned by the marketplace)
        // ============================================================
        db.execute_unprepared(TEACHER_PROFILES_SQL).await?;
        db.execute_unprepared(SUBJECT_OFFERINGS_SQL).await?;

        // ============================================================
        // PART 3: SCHEDULING
        // ============================================================
        db.execute_unprepared(AVAILABILITY_RULES_SQL).await?;
        db.execute_unprepared(BOOKINGS_SQL).await?;

        // ============================================================
        // PART 4: WALLET & PAYOUTS
        // ============================================================
        db.execute_unprepared(WALLET_ENTRIES_SQL).await?;
        db.execute_unprepared(PAYOUT_REQUESTS_SQL).await?;
        db.execute_unprepared(PAYOUT_ALLOCATIONS_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_ALL_SQL).await?;
        Ok(())
    }
}

// ============================================================
// SQL CONSTANTS
// ============================================================

/// Name of the constraint rejecting overlapping active bookings.
pub const BOOKING_OVERLAP_CONSTRAINT: &str = "bookings_no_overlap";

/// Name of the index allowing one exception per teacher and date.
pub const EXCEPTION_DATE_INDEX: &str = "uq_availability_exception_date";

const EXTENSIONS_SQL: &str = r"
-- Needed to mix uuid equality and range overlap in one GiST exclusion
CREATE EXTENSION IF NOT EXISTS btree_gist;
";

const ENUMS_SQL: &str = r"
CREATE TYPE availability_rule_type AS ENUM ('recurring', 'exception');

CREATE TYPE booking_status AS ENUM ('pending', 'confirmed', 'completed', 'cancelled');

CREATE TYPE booking_type AS ENUM ('trial', 'single', 'package');

CREATE TYPE booking_party AS ENUM ('student', 'teacher', 'system');

CREATE TYPE wallet_entry_kind AS ENUM ('earning', 'reversal');

CREATE TYPE wallet_entry_status AS ENUM ('pending', 'available', 'paid');

CREATE TYPE payout_status AS ENUM ('pending', 'approved', 'paid', 'rejected', 'failed');

CREATE TYPE payout_method AS ENUM ('bank_transfer', 'e_wallet');
";

const TEACHER_PROFILES_SQL: &str = r"
CREATE TABLE teacher_profiles (
    teacher_id UUID PRIMARY KEY,
    timezone VARCHAR(64) NOT NULL,
    allowed_durations JSONB NOT NULL DEFAULT '[60]',
    instant_confirmation BOOLEAN NOT NULL DEFAULT false,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_allowed_durations_array CHECK (jsonb_typeof(allowed_durations) = 'array')
);
";

const SUBJECT_OFFERINGS_SQL: &str = r"
CREATE TABLE subject_offerings (
    id UUID PRIMARY KEY,
    teacher_id UUID NOT NULL REFERENCES teacher_profiles(teacher_id) ON DELETE CASCADE,
    subject VARCHAR(120) NOT NULL,
    price_per_hour BIGINT NOT NULL,
    trial_price BIGINT,
    active BOOLEAN NOT NULL DEFAULT true,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_price_positive CHECK (price_per_hour > 0),
    CONSTRAINT chk_trial_price_non_negative CHECK (trial_price IS NULL OR trial_price >= 0)
);

CREATE INDEX idx_subject_offerings_teacher ON subject_offerings(teacher_id);
";

const AVAILABILITY_RULES_SQL: &str = r"
CREATE TABLE availability_rules (
    id UUID PRIMARY KEY,
    teacher_id UUID NOT NULL REFERENCES teacher_profiles(teacher_id) ON DELETE CASCADE,
    rule_type availability_rule_type NOT NULL,
    rule_date DATE,
    definition JSONB NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_exception_has_date CHECK (
        (rule_type = 'exception') = (rule_date IS NOT NULL)
    )
);

CREATE INDEX idx_availability_rules_teacher ON availability_rules(teacher_id, rule_type);

CREATE UNIQUE INDEX uq_availability_exception_date ON availability_rules(teacher_id, rule_date)
    WHERE rule_type = 'exception';
";

const BOOKINGS_SQL: &str = r"
CREATE TABLE bookings (
    id UUID PRIMARY KEY,
    teacher_id UUID NOT NULL REFERENCES teacher_profiles(teacher_id),
    student_id UUID NOT NULL,
    subject_offering_id UUID NOT NULL REFERENCES subject_offerings(id),
    start_at TIMESTAMPTZ NOT NULL,
    end_at TIMESTAMPTZ NOT NULL,
    status booking_status NOT NULL,
    booking_type booking_type NOT NULL,
    price BIGINT NOT NULL,
    cancellation_reason TEXT,
    cancelled_by booking_party,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    completed_at TIMESTAMPTZ,
    CONSTRAINT chk_booking_range CHECK (start_at < end_at),
    CONSTRAINT chk_booking_price CHECK (price >= 0),
    CONSTRAINT chk_cancellation CHECK (
        (status = 'cancelled') = (cancellation_reason IS NOT NULL AND cancelled_by IS NOT NULL)
    ),
    CONSTRAINT bookings_no_overlap EXCLUDE USING gist (
        teacher_id WITH =,
        tstzrange(start_at, end_at, '[)') WITH &&
    ) WHERE (status IN ('pending', 'confirmed'))
);

CREATE INDEX idx_bookings_teacher_start ON bookings(teacher_id, start_at DESC);

-- Settlement scan
CREATE INDEX idx_bookings_due ON bookings(status, end_at) WHERE status IN ('pending', 'confirmed');
";

const WALLET_ENTRIES_SQL: &str = r"
CREATE TABLE wallet_entries (
    id UUID PRIMARY KEY,
    teacher_id UUID NOT NULL REFERENCES teacher_profiles(teacher_id),
    booking_id UUID NOT NULL REFERENCES bookings(id),
    kind wallet_entry_kind NOT NULL,
    amount BIGINT NOT NULL,
    commission BIGINT NOT NULL,
    status wallet_entry_status NOT NULL,
    available_at TIMESTAMPTZ NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    reverses UUID UNIQUE REFERENCES wallet_entries(id),
    CONSTRAINT uq_wallet_entry_booking_kind UNIQUE (booking_id, kind),
    CONSTRAINT chk_reversal_link CHECK ((kind = 'reversal') = (reverses IS NOT NULL))
);

CREATE INDEX idx_wallet_entries_teacher ON wallet_entries(teacher_id, created_at, id);

-- Sweep scan
CREATE INDEX idx_wallet_entries_maturing ON wallet_entries(available_at)
    WHERE status = 'pending' AND kind = 'earning';
";

const PAYOUT_REQUESTS_SQL: &str = r"
CREATE TABLE payout_requests (
    id UUID PRIMARY KEY,
    teacher_id UUID NOT NULL REFERENCES teacher_profiles(teacher_id),
    amount BIGINT NOT NULL,
    method payout_method NOT NULL,
    status payout_status NOT NULL,
    account_ref VARCHAR(128) NOT NULL,
    requested_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    processed_at TIMESTAMPTZ,
    failure_reason TEXT,
    CONSTRAINT chk_payout_amount CHECK (amount > 0)
);

CREATE INDEX idx_payout_requests_teacher ON payout_requests(teacher_id, requested_at DESC);
";

const PAYOUT_ALLOCATIONS_SQL: &str = r"
CREATE TABLE payout_allocations (
    payout_request_id UUID NOT NULL REFERENCES payout_requests(id),
    wallet_entry_id UUID NOT NULL REFERENCES wallet_entries(id),
    amount BIGINT NOT NULL,
    PRIMARY KEY (payout_request_id, wallet_entry_id)
);

CREATE INDEX idx_payout_allocations_entry ON payout_allocations(wallet_entry_id);
";

const DROP_ALL_SQL: &str = r"
DROP TABLE IF EXISTS payout_allocations CASCADE;
DROP TABLE IF EXISTS payout_requests CASCADE;
DROP TABLE IF EXISTS wallet_entries CASCADE;
DROP TABLE IF EXISTS bookings CASCADE;
DROP TABLE IF EXISTS availability_rules CASCADE;
DROP TABLE IF EXISTS subject_offerings CASCADE;
DROP TABLE IF EXISTS teacher_profiles CASCADE;

DROP TYPE IF EXISTS payout_method;
DROP TYPE IF EXISTS payout_status;
DROP TYPE IF EXISTS wallet_entry_status;
DROP TYPE IF EXISTS wallet_entry_kind;
DROP TYPE IF EXISTS booking_party;
DROP TYPE IF EXISTS booking_type;
DROP TYPE IF EXISTS booking_status;
DROP TYPE IF EXISTS availability_rule_type;
";
