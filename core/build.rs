// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

fn main() {
    // the local store embeds its schema at compile time
    println!("cargo:rerun-if-changed=src/localdb/migrations");
}
