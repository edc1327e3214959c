use std::collections::BTreeSet;

fn main() -> shadow_rs::SdResult<()> {
    println!("cargo:rerun-if-changed=resources/reserved_words.json");

    let mut exclude = BTreeSet::new();
    exclude.insert("COMMIT_EMAIL");
    exclude.insert("COMMIT_AUTHOR");
    shadow_rs::new_deny(exclude)
}
