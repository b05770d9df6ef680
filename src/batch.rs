use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::Result;
use rayon::prelude::*;
use walkdir::WalkDir;

use crate::classify::ModalityScorer;
use crate::models::Modality;
use crate::pipeline::{self, UploadKind};

/// Classify every supported file under a directory.
///
/// Decode and preprocessing run in parallel; the shared session serializes
/// the inference calls themselves.
pub fn classify_directory(dir: &Path, scorer: &dyn ModalityScorer) -> Result<()> {
    println!("Processando diretório: {:?}", dir);

    let files: Vec<_> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            e.file_name()
                .to_str()
                .map_or(false, |name| UploadKind::from_filename(name).is_some())
        })
        .collect();

    println!("Encontrados {} arquivos.", files.len());

    let mri = AtomicUsize::new(0);
    let ct = AtomicUsize::new(0);
    let failures = AtomicUsize::new(0);

    files.par_iter().for_each(|entry| {
        let path = entry.path();
        match pipeline::classify_file(scorer, path) {
            Ok(outcome) => {
                match outcome.modality {
                    Modality::Mri => mri.fetch_add(1, Ordering::Relaxed),
                    Modality::Ct => ct.fetch_add(1, Ordering::Relaxed),
                };
                println!(
                    "{:?} -> {} ({:.4})",
                    path.file_name().unwrap(),
                    outcome.modality,
                    outcome.score
                );
            }
            Err(e) => {
                failures.fetch_add(1, Ordering::Relaxed);
                eprintln!("Erro em {:?}: {}", path, e);
            }
        }
    });

    println!(
        "Resumo: {} MRI | {} CT | {} falhas",
        mri.load(Ordering::Relaxed),
        ct.load(Ordering::Relaxed),
        failures.load(Ordering::Relaxed)
    );

    Ok(())
}
