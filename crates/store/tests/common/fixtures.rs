use defstore_core::{Coordinates, Definition, Described, FileEntry, Licensed, Score, Scores};
use defstore_store::FindResult;

/// npm coordinates without a namespace.
#[allow(dead_code)]
pub fn coordinates(name: &str, revision: &str) -> Coordinates {
    Coordinates::new("npm", "npmjs", None, name, Some(revision))
}

/// Definition with `count` numbered file entries.
#[allow(dead_code)]
pub fn definition_with_files(coordinates: Coordinates, count: usize) -> Definition {
    let mut definition = Definition::new(coordinates);
    definition.files = (0..count)
        .map(|i| {
            let mut file = FileEntry::new(format!("package/lib/file-{i:05}.js"));
            file.license = Some("MIT".to_string());
            file
        })
        .collect();
    definition
}

/// Definition with a license, an effective score and an optional release date.
#[allow(dead_code)]
pub fn scored_definition(
    name: &str,
    license: Option<&str>,
    effective: Option<i64>,
    release_date: Option<&str>,
) -> Definition {
    let mut definition = Definition::new(coordinates(name, "1.0.0"));
    definition.licensed = Some(Licensed {
        declared: license.map(str::to_string),
        score: effective.map(Score::with_total),
        ..Default::default()
    });
    definition.described = Some(Described {
        release_date: release_date.map(str::to_string),
        ..Default::default()
    });
    definition.scores = Some(Scores {
        effective,
        tool: effective,
    });
    definition
}

/// Canonical keys of a result page, in order.
#[allow(dead_code)]
pub fn keys(result: &FindResult) -> Vec<String> {
    result.data.iter().map(Definition::key).collect()
}
