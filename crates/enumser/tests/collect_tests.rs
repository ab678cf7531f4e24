mod common;

use common::{names, references, GoModule};
use enumser::collect::CollectError;
use enumser::emit::GeneratedFile;
use gosrc::{CheckErrorKind, Value};
use pretty_assertions::assert_eq;

// ===== Matching =====

#[test]
fn test_explicitly_typed_constants_in_order() {
    let module = GoModule::new().unwrap();
    module
        .file("p/p.go", "package p\n\ntype MyEnum int\n\nconst (\n\tA MyEnum = 1\n\tB MyEnum = 2\n)\n")
        .unwrap();

    let tables = module.collect(&["./p"], "M[MyEnum]", "p").unwrap();
    let table = &tables[0];
    assert_eq!(table.table, "M");
    assert_eq!(table.canonical_type_name, "p.MyEnum");
    assert_eq!(names(table), vec!["A", "B"]);
    let values: Vec<_> = table.entries.iter().map(|e| e.value.clone()).collect();
    assert_eq!(values, vec![Value::Int(1), Value::Int(2)]);
}

#[test]
fn test_implicit_repetition_carries_the_type() {
    let module = GoModule::new().unwrap().with_colors().unwrap();

    let tables = module.collect(&["./colors"], "Names[Color]", "colors").unwrap();
    assert_eq!(names(&tables[0]), vec!["Red", "Green", "Blue"]);
    assert_eq!(tables[0].entries[2].value, Value::Int(2));
}

#[test]
fn test_blank_identifier_skipped() {
    let module = GoModule::new().unwrap();
    module
        .file("p/p.go", "package p\n\ntype Level int\n\nconst (\n\t_ Level = iota\n\tLow\n\tHigh\n)\n")
        .unwrap();

    let tables = module.collect(&["./p"], "Levels[Level]", "p").unwrap();
    assert_eq!(names(&tables[0]), vec!["Low", "High"]);
    assert_eq!(tables[0].entries[0].value, Value::Int(1));
}

#[test]
fn test_untyped_and_other_types_not_matched() {
    let module = GoModule::new().unwrap();
    module
        .file(
            "p/p.go",
            "package p\n\ntype Kind int\ntype Other int\n\nconst (\n\tA Kind = 1\n\tLoose = 2\n\tB Other = 3\n)\n\nvar V Kind = 4\n",
        )
        .unwrap();

    let tables = module.collect(&["./p"], "Kinds[Kind]", "p").unwrap();
    assert_eq!(names(&tables[0]), vec!["A"]);
}

#[test]
fn test_conversion_without_declared_type_not_matched() {
    let module = GoModule::new().unwrap();
    module
        .file(
            "p/p.go",
            "package p\n\ntype Code string\n\nconst Ok Code = \"ok\"\n\nconst Legacy = Code(\"legacy\")\n",
        )
        .unwrap();

    let tables = module.collect(&["./p"], "Codes[Code]", "p").unwrap();
    assert_eq!(names(&tables[0]), vec!["Ok"]);
    assert_eq!(tables[0].entries[0].value, Value::String("ok".to_string()));
}

#[test]
fn test_constant_initialised_from_member_not_matched() {
    let module = GoModule::new().unwrap();
    module
        .file(
            "p/p.go",
            "package p\n\ntype Color int\n\nconst (\n\tRed Color = 0\n\tGreen Color = 1\n)\n\nconst Default = Red\n",
        )
        .unwrap();

    let tables = module.collect(&["./p"], "Names[Color]", "p").unwrap();
    assert_eq!(names(&tables[0]), vec!["Red", "Green"]);
    assert!(tables[0].duplicate_values().is_empty());
}

#[test]
fn test_type_alias_matches_target_type() {
    let module = GoModule::new().unwrap().with_colors().unwrap();
    module.file("colors/extra.go", "package colors\n\ntype Hue = Color\n\nconst Cyan Hue = 9\n").unwrap();

    let tables = module.collect(&["./colors"], "Names[Color]", "colors").unwrap();
    assert_eq!(names(&tables[0]), vec!["Red", "Green", "Blue", "Cyan"]);
}

// ===== Cross-Package Tables =====

#[test]
fn test_constants_across_two_packages_merge() {
    let module = GoModule::new().unwrap().with_colors().unwrap();
    module
        .file(
            "extra/extra.go",
            "package extra\n\nimport \"example.com/m/colors\"\n\nconst Purple colors.Color = 10\n",
        )
        .unwrap();

    let tables = module.collect(&["./colors", "./extra"], "Names[Color]", "colors").unwrap();
    let table = &tables[0];
    assert_eq!(references(table), vec!["Red", "Green", "Blue", "extra.Purple"]);
    assert_eq!(table.canonical_type_name, "colors.Color");
    let imports: Vec<_> = table.required_imports.iter().map(String::as_str).collect();
    assert_eq!(imports, vec!["example.com/m/colors", "example.com/m/extra"]);
}

#[test]
fn test_foreign_enum_type_for_other_output_package() {
    let module = GoModule::new().unwrap().with_colors().unwrap();

    let tables = module.collect(&["./colors"], "Names[colors.Color]", "names").unwrap();
    let table = &tables[0];
    assert_eq!(references(table), vec!["colors.Red", "colors.Green", "colors.Blue"]);
    assert_eq!(table.canonical_type_name, "colors.Color");
}

#[test]
fn test_aliased_import_uses_canonical_package() {
    let module = GoModule::new().unwrap().with_colors().unwrap();
    module
        .file(
            "extra/extra.go",
            "package extra\n\nimport c \"example.com/m/colors\"\n\nconst Teal c.Color = 11\n",
        )
        .unwrap();

    let tables = module.collect(&["./extra"], "Names[colors.Color]", "extra").unwrap();
    let table = &tables[0];
    assert_eq!(references(table), vec!["Teal"]);
    assert_eq!(table.canonical_type_name, "colors.Color");
    assert!(table.required_imports.contains("example.com/m/colors"));
}

#[test]
fn test_dependency_constants_are_not_collected() {
    let module = GoModule::new().unwrap().with_colors().unwrap();
    module
        .file(
            "extra/extra.go",
            "package extra\n\nimport \"example.com/m/colors\"\n\nconst Top = colors.Blue\n\nconst Teal colors.Color = Top + 9\n",
        )
        .unwrap();

    // colors is loaded only to evaluate Top and Teal
    let tables = module.collect(&["./extra"], "Names[colors.Color]", "extra").unwrap();
    assert_eq!(references(&tables[0]), vec!["Teal"]);
    assert_eq!(tables[0].entries[0].value, Value::Int(11));
}

// ===== Multiple Specs =====

#[test]
fn test_disjoint_specs_share_no_entries() {
    let module = GoModule::new().unwrap().with_colors().unwrap();
    module
        .file("colors/size.go", "package colors\n\ntype Size int\n\nconst (\n\tSmall Size = iota\n\tLarge\n)\n")
        .unwrap();

    let tables = module.collect(&["./colors"], "Sizes[Size],Names[Color]", "colors").unwrap();
    assert_eq!(tables.len(), 2);
    assert_eq!(tables[0].table, "Sizes");
    assert_eq!(names(&tables[0]), vec!["Small", "Large"]);
    assert_eq!(names(&tables[1]), vec!["Red", "Green", "Blue"]);
}

#[test]
fn test_entries_follow_file_name_order() {
    let module = GoModule::new().unwrap();
    module.file("p/b.go", "package p\n\nconst First Kind = 1\n").unwrap();
    module.file("p/a.go", "package p\n\ntype Kind int\n\nconst Second Kind = 2\n").unwrap();

    let tables = module.collect(&["./p"], "Kinds[Kind]", "p").unwrap();
    assert_eq!(names(&tables[0]), vec!["Second", "First"]);
}

#[test]
fn test_duplicate_values_kept_and_reported() {
    let module = GoModule::new().unwrap();
    module
        .file("p/p.go", "package p\n\ntype Kind int\n\nconst (\n\tA Kind = 1\n\tAlsoA Kind = 1\n)\n")
        .unwrap();

    let tables = module.collect(&["./p"], "Kinds[Kind]", "p").unwrap();
    assert_eq!(names(&tables[0]), vec!["A", "AlsoA"]);
    let duplicates = tables[0].duplicate_values();
    assert_eq!(duplicates.len(), 1);
    assert_eq!((duplicates[0].first.as_str(), duplicates[0].second.as_str()), ("A", "AlsoA"));
}

// ===== Unevaluable Constants =====

#[test]
fn test_unrelated_unevaluable_constants_ignored() {
    let module = GoModule::new().unwrap();
    module
        .file(
            "p/p.go",
            "package p\n\n\
             import (\n\t\"math\"\n\t\"time\"\n)\n\n\
             const Timeout = 5 * time.Second\n\
             const Limit = math.MaxInt32\n\
             const I = 1i\n\n\
             type Color int\n\n\
             const (\n\tRed Color = 0\n\tGreen Color = 1\n)\n",
        )
        .unwrap();

    let tables = module.collect(&["./p"], "Names[Color]", "p").unwrap();
    assert_eq!(names(&tables[0]), vec!["Red", "Green"]);
}

#[test]
fn test_unevaluable_member_is_an_error() {
    let module = GoModule::new().unwrap();
    module
        .file("p/p.go", "package p\n\ntype Kind int\n\nconst (\n\tA Kind = 1\n\tB Kind = 1 / 0\n)\n")
        .unwrap();

    let err = module.collect(&["./p"], "Kinds[Kind]", "p").unwrap_err();
    match err {
        CollectError::Check { name, type_name, source } => {
            assert_eq!(name, "B");
            assert_eq!(type_name, "p.Kind");
            assert_eq!(source.kind, CheckErrorKind::DivisionByZero);
        }
        other => panic!("expected a check failure, got {:?}", other),
    }
}

#[test]
fn test_unevaluable_member_of_other_type_ignored() {
    let module = GoModule::new().unwrap();
    module
        .file(
            "p/p.go",
            "package p\n\ntype Kind int\ntype Other int\n\nconst (\n\tA Kind = 1\n\tB Other = 1 / 0\n)\n",
        )
        .unwrap();

    let tables = module.collect(&["./p"], "Kinds[Kind]", "p").unwrap();
    assert_eq!(names(&tables[0]), vec!["A"]);
}

// ===== Errors =====

#[test]
fn test_no_matches_is_an_error() {
    let module = GoModule::new().unwrap().with_colors().unwrap();

    let err = module.collect(&["./colors"], "Names[Shade]", "colors").unwrap_err();
    assert!(matches!(err, CollectError::NoMatches { ref spec, .. } if spec == "Names[Shade]"));
}

#[test]
fn test_wrong_package_is_no_match() {
    let module = GoModule::new().unwrap().with_colors().unwrap();

    let err = module.collect(&["./colors"], "Names[paint.Color]", "colors").unwrap_err();
    assert!(matches!(err, CollectError::NoMatches { .. }));
}

// ===== Rendering =====

#[test]
fn test_generated_file_for_local_enum() {
    let module = GoModule::new().unwrap();
    module
        .file(
            "pkgname/pkgname.go",
            "package pkgname\n\ntype Color int\n\nconst (\n\tRed Color = 0\n\tGreen Color = 1\n)\n",
        )
        .unwrap();

    let tables = module.collect(&["./pkgname"], "Names[Color]", "pkgname").unwrap();
    let rendered = GeneratedFile::new("pkgname", &tables).render().unwrap();
    assert_eq!(
        rendered,
        "// Code generated by enum_serialize. DO NOT EDIT.\n\
         \n\
         package pkgname\n\
         \n\
         import \"example.com/m/pkgname\"\n\
         \n\
         var Names = map[pkgname.Color]string{\n\
         \tRed:   \"Red\",\n\
         \tGreen: \"Green\",\n\
         }\n"
    );
}

#[test]
fn test_generated_imports_sorted_across_tables() {
    let module = GoModule::new().unwrap().with_colors().unwrap();
    module
        .file("kinds/kinds.go", "package kinds\n\ntype Kind int\n\nconst (\n\tSolid Kind = iota\n\tLiquid\n)\n")
        .unwrap();

    let tables = module.collect(&["./kinds", "./colors"], "Names[colors.Color],Kinds[kinds.Kind]", "out").unwrap();
    let rendered = GeneratedFile::new("out", &tables).render().unwrap();
    assert!(rendered.contains("import (\n\t\"example.com/m/colors\"\n\t\"example.com/m/kinds\"\n)\n"));
    assert!(rendered.contains("var Names = map[colors.Color]string{\n\tcolors.Red:   \"Red\",\n"));
    assert!(rendered.find("var Names").unwrap() < rendered.find("var Kinds").unwrap());
}
