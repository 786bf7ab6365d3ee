use comfy_table::{Cell, Table};

use crate::engine::Engine;
use crate::error::Result;
use crate::models::Payee;

pub fn add(engine: &Engine, name: &str, notes: Option<&str>) -> Result<()> {
    let mut payee = Payee::new(name)?;
    if let Some(notes) = notes {
        payee.notes = notes.to_string();
    }
    engine.save_payee(&mut payee)?;
    println!("Added payee: {name}");
    Ok(())
}

pub fn list(engine: &Engine) -> Result<()> {
    let payees = engine.get_payees()?;
    let mut table = Table::new();
    table.set_header(vec!["ID", "Name", "Notes"]);
    for payee in payees {
        table.add_row(vec![
            Cell::new(payee.id.unwrap_or_default()),
            Cell::new(payee.name),
            Cell::new(payee.notes),
        ]);
    }
    println!("Payees\n{table}");
    Ok(())
}
