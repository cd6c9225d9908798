//! Database seeder for Worktally development and testing.
//!
//! Seeds a small demo hierarchy (one geography, two clients, a handful of
//! process projects and locations) with request-type rates and productivity
//! tiers, then activates the seeded generation.
//!
//! Usage: cargo run --bin seeder

use std::str::FromStr;

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};
use uuid::Uuid;
use worktally_core::vocab::{ProcessType, ProductivityLevel, RequestType};
use worktally_db::entities::{
    active_generations, clients, geographies, productivity_tiers, projects, request_type_rates,
    subprojects,
};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let database_url =
        std::env::var("DATABASE_URL").expect("DATABASE_URL must be set in environment");

    println!("Connecting to database...");
    let db = worktally_db::connect(&database_url)
        .await
        .expect("Failed to connect to database");

    if active_generations::Entity::find_by_id("hierarchy".to_string())
        .one(&db)
        .await
        .ok()
        .flatten()
        .is_some()
    {
        println!("Hierarchy already seeded (active generation present), skipping.");
        return;
    }

    let generation = Uuid::new_v4();
    println!("Seeding demo hierarchy (generation {generation})...");
    seed_hierarchy(&db, generation).await;

    println!("Activating generation...");
    let pointer = active_generations::ActiveModel {
        scope: Set("hierarchy".to_string()),
        generation: Set(generation),
        activated_at: Set(Utc::now().into()),
    };
    if let Err(e) = pointer.insert(&db).await {
        eprintln!("Failed to activate generation: {e}");
        return;
    }

    println!("Seeding complete!");
}

fn dec(value: &str) -> Decimal {
    Decimal::from_str(value).expect("seed literal is a valid decimal")
}

#[allow(clippy::too_many_lines)]
async fn seed_hierarchy(db: &DatabaseConnection, generation: Uuid) {
    let now = Utc::now().into();

    let geography_id = Uuid::new_v4();
    let geography = geographies::ActiveModel {
        id: Set(geography_id),
        name: Set("Offshore".to_string()),
        status: Set("active".to_string()),
        generation: Set(generation),
        created_at: Set(now),
        updated_at: Set(now),
    };
    if let Err(e) = geography.insert(db).await {
        eprintln!("Failed to insert geography: {e}");
        return;
    }
    println!("  Created geography: Offshore");

    // (client name, process projects with their locations)
    let plan: [(&str, &[(ProcessType, &[&str])]); 2] = [
        (
            "Offshore Client 1",
            &[
                (ProcessType::Intake, &["Berlin", "Hamburg"]),
                (ProcessType::Indexing, &["Berlin"]),
            ],
        ),
        (
            "Offshore Client 2",
            &[(ProcessType::Intake, &["Osaka"])],
        ),
    ];

    for (client_name, processes) in plan {
        let client_id = Uuid::new_v4();
        let client = clients::ActiveModel {
            id: Set(client_id),
            name: Set(client_name.to_string()),
            geography_id: Set(geography_id),
            geography_name: Set("Offshore".to_string()),
            status: Set("active".to_string()),
            generation: Set(generation),
            created_at: Set(now),
            updated_at: Set(now),
        };
        if let Err(e) = client.insert(db).await {
            eprintln!("Failed to insert client {client_name}: {e}");
            continue;
        }
        println!("  Created client: {client_name}");

        for (process, locations) in processes {
            let project_id = Uuid::new_v4();
            let project = projects::ActiveModel {
                id: Set(project_id),
                name: Set(process.label().to_string()),
                client_id: Set(client_id),
                client_name: Set(client_name.to_string()),
                geography_id: Set(geography_id),
                geography_name: Set("Offshore".to_string()),
                flatrate: Set(Decimal::ZERO),
                status: Set("active".to_string()),
                generation: Set(generation),
                created_at: Set(now),
                updated_at: Set(now),
            };
            if let Err(e) = project.insert(db).await {
                eprintln!("Failed to insert project {}: {e}", process.label());
                continue;
            }

            for location in *locations {
                let subproject_id = Uuid::new_v4();
                let subproject = subprojects::ActiveModel {
                    id: Set(subproject_id),
                    name: Set((*location).to_string()),
                    project_id: Set(project_id),
                    project_name: Set(process.label().to_string()),
                    client_id: Set(client_id),
                    client_name: Set(client_name.to_string()),
                    geography_id: Set(geography_id),
                    geography_name: Set("Offshore".to_string()),
                    flatrate: Set(Decimal::ZERO),
                    status: Set("active".to_string()),
                    generation: Set(generation),
                    created_at: Set(now),
                    updated_at: Set(now),
                };
                if let Err(e) = subproject.insert(db).await {
                    eprintln!("Failed to insert subproject {location}: {e}");
                    continue;
                }

                seed_rates(db, subproject_id, generation).await;
            }
        }
    }
}

/// Seeds request-type rates and two productivity tiers for one subproject.
async fn seed_rates(db: &DatabaseConnection, subproject_id: Uuid, generation: Uuid) {
    let now = Utc::now().into();

    let rates = [
        (RequestType::NewRequest, "2.50"),
        (RequestType::Rework, "1.25"),
        (RequestType::Clarification, "0.75"),
    ];
    for (request_type, rate) in rates {
        let model = request_type_rates::ActiveModel {
            id: Set(Uuid::new_v4()),
            subproject_id: Set(subproject_id),
            request_type: Set(request_type.label().to_string()),
            rate: Set(dec(rate)),
            generation: Set(generation),
            created_at: Set(now),
            updated_at: Set(now),
        };
        if let Err(e) = model.insert(db).await {
            eprintln!("Failed to insert rate {}: {e}", request_type.label());
        }
    }

    let tiers = [
        (ProductivityLevel::Low, "1.00"),
        (ProductivityLevel::High, "4.00"),
    ];
    for (level, base_rate) in tiers {
        let model = productivity_tiers::ActiveModel {
            id: Set(Uuid::new_v4()),
            subproject_id: Set(subproject_id),
            level: Set(level.label().to_string()),
            base_rate: Set(dec(base_rate)),
            created_at: Set(now),
            updated_at: Set(now),
        };
        if let Err(e) = model.insert(db).await {
            eprintln!("Failed to insert tier {}: {e}", level.label());
        }
    }
}
