//! # Seed Data Generator
//!
//! Populates a database with demo stock items and materials for one
//! account, for local development.
//!
//! ## Usage
//! ```bash
//! cargo run -p atelie-db --bin seed -- --account demo
//! cargo run -p atelie-db --bin seed -- --account demo --db ./data/atelie.db
//! ```

use std::env;

use atelie_core::{AccountId, Money, UnitFinancials};
use atelie_db::{Database, DbConfig, DbError, MaterialInput, StockItemInput};

/// (produto, quantidade, valor_venda, custo, salario, margem), in centavos.
const STOCK: &[(&str, i64, i64, i64, i64, i64)] = &[
    ("Caneca esmaltada", 12, 4500, 1200, 1800, 900),
    ("Vaso de argila P", 8, 6800, 2100, 2500, 1500),
    ("Vaso de argila G", 3, 12900, 4200, 4500, 3000),
    ("Prato raso", 20, 3900, 1000, 1400, 800),
    ("Tigela decorada", 6, 5500, 1600, 2000, 1200),
    ("Porta-incenso", 15, 2500, 500, 900, 600),
];

/// (nome, unidade, custo_unitario)
const MATERIALS: &[(&str, &str, i64)] = &[
    ("Argila branca", "kg", 850),
    ("Esmalte transparente", "l", 6400),
    ("Engobe", "l", 3900),
    ("Fita de cetim", "m", 120),
    ("Caixa kraft", "un", 350),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut account = String::from("demo");
    let mut db_path = String::from("./atelie_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--account" | "-a" => {
                if i + 1 < args.len() {
                    account = args[i + 1].clone();
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Atelie Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -a, --account <ID>  Owning account (default: demo)");
                println!("  -d, --db <PATH>     Database file path (default: ./atelie_dev.db)");
                println!("  -h, --help          Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    let owner = AccountId::new(account)?;

    println!("Atelie Seed Data Generator");
    println!("==========================");
    println!("Database: {}", db_path);
    println!("Account:  {}", owner);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database, migrations applied");

    let mut stock = 0;
    for &(produto, quantidade, venda, custo, salario, margem) in STOCK {
        let input = StockItemInput {
            produto: produto.to_string(),
            quantidade,
            valor_venda: Money::from_cents(venda),
            financeiro: UnitFinancials {
                custo: Money::from_cents(custo),
                salario: Money::from_cents(salario),
                margem: Money::from_cents(margem),
            },
        };
        match db.stock().register(&owner, &input).await {
            Ok(_) => stock += 1,
            Err(DbError::UniqueViolation { .. }) => println!("  skip {} (exists)", produto),
            Err(e) => return Err(e.into()),
        }
    }

    let mut materials = 0;
    for &(nome, unidade, custo) in MATERIALS {
        let input = MaterialInput {
            nome: nome.to_string(),
            unidade: unidade.to_string(),
            custo_unitario: Money::from_cents(custo),
        };
        match db.materials().create(&owner, &input).await {
            Ok(_) => materials += 1,
            Err(DbError::UniqueViolation { .. }) => println!("  skip {} (exists)", nome),
            Err(e) => return Err(e.into()),
        }
    }

    println!();
    println!("✓ Seeded {} stock items and {} materials", stock, materials);
    db.close().await;

    Ok(())
}
