//! Initial schema: hierarchy, rates, resources, allocations, billing.
//!
//! Hierarchy and rate tables carry a `generation` column; the
//! `active_generations` pointer table decides which generation readers see.
//! Full-replace imports stage a new generation and flip the pointer, so a
//! crash mid-import never leaves a half-empty hierarchy visible.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(INITIAL_SQL).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(
            "DROP TABLE IF EXISTS invoices, billings, allocation_summaries, \
             resource_assignments, resources, productivity_tiers, request_type_rates, \
             subprojects, projects, clients, geographies, active_generations CASCADE;",
        )
        .await?;
        Ok(())
    }
}

const INITIAL_SQL: &str = r"
-- Generation pointer: which hierarchy/rate generation is live per scope
CREATE TABLE active_generations (
    scope VARCHAR(32) PRIMARY KEY,
    generation UUID NOT NULL,
    activated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

-- Hierarchy: geography -> client -> project -> subproject
CREATE TABLE geographies (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    name VARCHAR(255) NOT NULL,
    status VARCHAR(16) NOT NULL DEFAULT 'active',
    generation UUID NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE UNIQUE INDEX idx_geographies_name_gen ON geographies(lower(name), generation);

CREATE TABLE clients (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    name VARCHAR(255) NOT NULL,
    geography_id UUID NOT NULL REFERENCES geographies(id) ON DELETE CASCADE,
    geography_name VARCHAR(255) NOT NULL,
    status VARCHAR(16) NOT NULL DEFAULT 'active',
    generation UUID NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE UNIQUE INDEX idx_clients_geo_name_gen ON clients(geography_id, lower(name), generation);
CREATE INDEX idx_clients_geography ON clients(geography_id);

CREATE TABLE projects (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    name VARCHAR(255) NOT NULL,
    client_id UUID NOT NULL REFERENCES clients(id) ON DELETE CASCADE,
    client_name VARCHAR(255) NOT NULL,
    geography_id UUID NOT NULL,
    geography_name VARCHAR(255) NOT NULL,
    flatrate NUMERIC(14, 4) NOT NULL DEFAULT 0,
    status VARCHAR(16) NOT NULL DEFAULT 'active',
    generation UUID NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE UNIQUE INDEX idx_projects_client_name_gen ON projects(client_id, lower(name), generation);
CREATE INDEX idx_projects_client ON projects(client_id);

CREATE TABLE subprojects (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    name VARCHAR(255) NOT NULL,
    project_id UUID NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
    project_name VARCHAR(255) NOT NULL,
    client_id UUID NOT NULL,
    client_name VARCHAR(255) NOT NULL,
    geography_id UUID NOT NULL,
    geography_name VARCHAR(255) NOT NULL,
    flatrate NUMERIC(14, 4) NOT NULL DEFAULT 0,
    status VARCHAR(16) NOT NULL DEFAULT 'active',
    generation UUID NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE UNIQUE INDEX idx_subprojects_proj_name_gen ON subprojects(project_id, lower(name), generation);
CREATE INDEX idx_subprojects_project ON subprojects(project_id);

-- Rates: per-request-type card rates and productivity tier base rates
CREATE TABLE request_type_rates (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    subproject_id UUID NOT NULL REFERENCES subprojects(id) ON DELETE CASCADE,
    request_type VARCHAR(32) NOT NULL,
    rate NUMERIC(14, 4) NOT NULL,
    generation UUID NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE UNIQUE INDEX idx_request_type_rates_key ON request_type_rates(subproject_id, request_type, generation);

CREATE TABLE productivity_tiers (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    subproject_id UUID NOT NULL REFERENCES subprojects(id) ON DELETE CASCADE,
    level VARCHAR(16) NOT NULL,
    base_rate NUMERIC(14, 4) NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE UNIQUE INDEX idx_productivity_tiers_key ON productivity_tiers(subproject_id, level);

-- Resources and their subproject assignments
CREATE TABLE resources (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    name VARCHAR(255) NOT NULL,
    email VARCHAR(255) NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

-- Emails are lowercased before every write, so a plain unique index suffices
CREATE UNIQUE INDEX idx_resources_email ON resources(email);

CREATE TABLE resource_assignments (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    resource_id UUID NOT NULL REFERENCES resources(id) ON DELETE CASCADE,
    geography_id UUID NOT NULL,
    client_id UUID NOT NULL,
    project_id UUID NOT NULL,
    subproject_id UUID NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE UNIQUE INDEX idx_resource_assignments_key ON resource_assignments(resource_id, subproject_id);

-- Aggregated allocation facts, regenerated per upload window
CREATE TABLE allocation_summaries (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    geography_id UUID NOT NULL,
    client_id UUID NOT NULL,
    project_id UUID NOT NULL,
    subproject_id UUID NOT NULL,
    geography_name VARCHAR(255) NOT NULL,
    client_name VARCHAR(255) NOT NULL,
    project_name VARCHAR(255) NOT NULL,
    subproject_name VARCHAR(255) NOT NULL,
    request_type VARCHAR(32) NOT NULL,
    allocation_date DATE NOT NULL,
    day INTEGER NOT NULL,
    month INTEGER NOT NULL,
    year INTEGER NOT NULL,
    count BIGINT NOT NULL,
    resource_names JSONB NOT NULL DEFAULT '[]'::jsonb,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE UNIQUE INDEX idx_allocation_summaries_key ON allocation_summaries(subproject_id, request_type, allocation_date);
CREATE INDEX idx_allocation_summaries_period ON allocation_summaries(year, month);
CREATE INDEX idx_allocation_summaries_client ON allocation_summaries(client_id, allocation_date);

-- Billing records, upserted on the compound business key
CREATE TABLE billings (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    geography_id UUID NOT NULL,
    client_id UUID NOT NULL,
    project_id UUID NOT NULL,
    subproject_id UUID NOT NULL,
    resource_id UUID NOT NULL REFERENCES resources(id) ON DELETE CASCADE,
    request_type VARCHAR(32) NOT NULL,
    month INTEGER NOT NULL,
    year INTEGER NOT NULL,
    hours NUMERIC(14, 4) NOT NULL DEFAULT 0,
    rate NUMERIC(14, 4) NOT NULL DEFAULT 0,
    flatrate NUMERIC(14, 4) NOT NULL DEFAULT 0,
    costing NUMERIC(14, 4) NOT NULL DEFAULT 0,
    total_amount NUMERIC(14, 4) NOT NULL DEFAULT 0,
    billable_status VARCHAR(16) NOT NULL DEFAULT 'billable',
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE UNIQUE INDEX idx_billings_key ON billings(resource_id, subproject_id, request_type, month, year);
CREATE INDEX idx_billings_period ON billings(year, month);

-- Immutable invoice snapshots
CREATE TABLE invoices (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    month INTEGER NOT NULL,
    year INTEGER NOT NULL,
    lines JSONB NOT NULL DEFAULT '[]'::jsonb,
    total_hours NUMERIC(14, 4) NOT NULL DEFAULT 0,
    total_amount NUMERIC(14, 4) NOT NULL DEFAULT 0,
    generated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_invoices_period ON invoices(year, month, generated_at DESC);
";
