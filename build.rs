use std::collections::HashSet;
use std::path::Path;

fn main() {
    let catalog_path = Path::new("catalogs/functional_groups.json");
    validate_catalog_file(catalog_path);
    set_build_dependencies();
}

fn validate_catalog_file(catalog_path: &Path) {
    // Ensure catalog exists at build time
    assert!(
        catalog_path.exists(),
        "\n\nCATALOG BUILD ERROR: File not found\n\
         Path: {}\n\
         Please create the catalog file before building.\n",
        catalog_path.display()
    );

    let catalog_contents = std::fs::read_to_string(catalog_path).unwrap_or_else(|e| {
        panic!(
            "\n\nCATALOG BUILD ERROR: Failed to read file\n\
             Path: {}\n\
             Error: {e}\n",
            catalog_path.display()
        );
    });

    let catalog: serde_json::Value = serde_json::from_str(&catalog_contents).unwrap_or_else(|e| {
        panic!(
            "\n\nCATALOG BUILD ERROR: Invalid JSON\n\
             Path: {}\n\
             Error: {e}\n\
             Hint: Check for missing commas, brackets, or invalid syntax.\n",
            catalog_path.display()
        );
    });

    validate_catalog_structure(&catalog);
}

fn validate_catalog_structure(catalog: &serde_json::Value) {
    assert!(
        catalog.is_object(),
        "\n\nCATALOG BUILD ERROR: Root must be a JSON object\n\
         Got: {catalog}\n"
    );

    let groups = catalog.get("functional_groups").unwrap_or_else(|| {
        panic!(
            "\n\nCATALOG BUILD ERROR: Missing 'functional_groups' field\n\
             The catalog must have a top-level 'functional_groups' array.\n"
        );
    });

    let groups = groups.as_array().unwrap_or_else(|| {
        panic!(
            "\n\nCATALOG BUILD ERROR: 'functional_groups' must be an array\n\
             Got: {groups}\n"
        );
    });

    let with_fallback = validate_groups(groups);

    println!(
        "cargo:warning=Validated catalog: {} functional groups, {with_fallback} with simplified patterns",
        groups.len()
    );
}

fn validate_groups(groups: &[serde_json::Value]) -> usize {
    let mut names = HashSet::new();
    let mut with_fallback = 0;

    for (i, group) in groups.iter().enumerate() {
        let name = group
            .get("name")
            .and_then(|v| v.as_str())
            .unwrap_or_else(|| {
                panic!("\n\nCATALOG BUILD ERROR: Group at index {i} missing 'name' field\n")
            });

        assert!(
            !name.trim().is_empty(),
            "\n\nCATALOG BUILD ERROR: Group at index {i} has an empty 'name'\n"
        );

        assert!(
            names.insert(name.to_string()),
            "\n\nCATALOG BUILD ERROR: Duplicate group name '{name}' (index {i})\n\
             Group names must be unique.\n"
        );

        validate_group_patterns(group, name, i);

        if group
            .get("simplified")
            .and_then(|v| v.as_str())
            .is_some_and(|s| !s.trim().is_empty())
        {
            with_fallback += 1;
        }
    }

    with_fallback
}

fn validate_group_patterns(group: &serde_json::Value, name: &str, index: usize) {
    let smarts = group.get("smarts").and_then(|v| v.as_str());
    assert!(
        smarts.is_some(),
        "\n\nCATALOG BUILD ERROR: Group '{name}' (index {index}) missing 'smarts' field\n"
    );

    if let Some(specificity) = group.get("specificity") {
        assert!(
            specificity.is_i64(),
            "\n\nCATALOG BUILD ERROR: Group '{name}' (index {index}) has a non-integer 'specificity'\n\
             Got: {specificity}\n"
        );
    }
}

fn set_build_dependencies() {
    // Tell cargo to rerun if catalog changes
    println!("cargo:rerun-if-changed=catalogs/functional_groups.json");

    // Tell cargo to rerun if build.rs changes
    println!("cargo:rerun-if-changed=build.rs");
}
