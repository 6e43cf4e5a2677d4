use refresher_config::load_recipes_csv;
use std::io::Write;
use tempfile::NamedTempFile;

fn write_csv(content: &str) -> NamedTempFile {
    let mut f = NamedTempFile::new().expect("tempfile");
    f.write_all(content.as_bytes()).expect("write csv");
    f
}

#[test]
fn loads_well_formed_table() {
    let f = write_csv(
        "name,pump1,pump2,pump3,pump4,water\n\
         lemonade,0.5,0,0,0.5,0\n\
         mango dragonfruit,0,0,0,0.5,0\n",
    );
    let recipes = load_recipes_csv(f.path()).expect("load");
    assert_eq!(recipes.len(), 2);
    assert_eq!(recipes[0].name, "lemonade");
    assert_eq!(recipes[0].ratios, [0.5, 0.0, 0.0, 0.5, 0.0]);
    assert_eq!(recipes[1].ratios[3], 0.5);
}

#[test]
fn rejects_wrong_headers() {
    let f = write_csv("drink,p1,p2,p3,p4,h2o\nlemonade,0.5,0,0,0.5,0\n");
    let err = load_recipes_csv(f.path()).expect_err("headers must match");
    assert!(format!("{err}").contains("headers"));
}

#[test]
fn rejects_malformed_row_with_line_number() {
    let f = write_csv(
        "name,pump1,pump2,pump3,pump4,water\n\
         lemonade,0.5,0,0,0.5,0\n\
         broken,abc,0,0,0,0\n",
    );
    let err = load_recipes_csv(f.path()).expect_err("bad float should fail");
    assert!(format!("{err}").contains("row 3"));
}

#[test]
fn rejects_empty_table() {
    let f = write_csv("name,pump1,pump2,pump3,pump4,water\n");
    assert!(load_recipes_csv(f.path()).is_err());
}

#[test]
fn rejects_more_rows_than_menu_letters() {
    let f = write_csv(
        "name,pump1,pump2,pump3,pump4,water\n\
         a,0.1,0,0,0,0\n\
         b,0.1,0,0,0,0\n\
         c,0.1,0,0,0,0\n\
         d,0.1,0,0,0,0\n\
         e,0.1,0,0,0,0\n",
    );
    let err = load_recipes_csv(f.path()).expect_err("five rows should fail");
    assert!(format!("{err}").contains("at most"));
}
