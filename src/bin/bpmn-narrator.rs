use std::io::Write;
use std::path::{Path, PathBuf};

use bpmn_narrator::render_from_path;

extern crate pretty_env_logger;

fn pick_bpmn_from_folder(base: &Path) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let mut candidates: Vec<PathBuf> = std::fs::read_dir(base)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().and_then(|e| e.to_str()) == Some("bpmn"))
        .collect();
    candidates.sort();

    if candidates.is_empty() {
        return Err(format!("Nenhum arquivo .bpmn encontrado em {}", base.display()).into());
    }

    println!("Selecione o BPMN:");
    for (idx, path) in candidates.iter().enumerate() {
        println!("{}. {}", idx + 1, path.file_name().unwrap_or_default().to_string_lossy());
    }
    print!("Número do BPMN: ");
    std::io::stdout().flush()?;

    let mut input = String::new();
    let choice = match std::io::stdin().read_line(&mut input) {
        Ok(0) => "1".to_string(),
        Ok(_) => input.trim().to_string(),
        Err(_) => "1".to_string(),
    };

    let index: usize = choice.parse().unwrap_or(0);
    if index == 0 || index > candidates.len() {
        return Err("Seleção inválida.".into());
    }
    Ok(candidates[index - 1].clone())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();

    let bpmn_path = match std::env::args().nth(1) {
        Some(arg) => PathBuf::from(arg),
        None => pick_bpmn_from_folder(&std::env::current_dir()?)?,
    };

    if !bpmn_path.exists() {
        return Err(format!("Arquivo BPMN nao encontrado: {}", bpmn_path.display()).into());
    }

    println!("{}", render_from_path(&bpmn_path)?);
    Ok(())
}
