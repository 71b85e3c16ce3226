// Copyright 2019 The Skylark in Rust Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The lex/parse round-trip property: pretty-printing a parsed tree and
//! parsing the output again yields a structurally equivalent tree. The
//! printer is deterministic, so structural equivalence is checked by
//! comparing the second print with the first.

use codemap::CodeMap;
use skylark::syntax::parser::parse;
use std::sync::{Arc, Mutex};

fn printed(content: &str) -> String {
    let map = Arc::new(Mutex::new(CodeMap::new()));
    format!("{}", parse(&map, "<test>", content).unwrap().node)
}

fn assert_round_trips(content: &str) {
    let once = printed(content);
    let twice = printed(&once);
    assert_eq!(once, twice, "print/parse/print diverged for {:?}", content);
}

#[test]
fn expressions_round_trip() {
    for source in &[
        "x = 1 + 2 * 3 % 4 - 5\n",
        "x = 1 << 2 | 3 & 4 ^ 5 >> 6\n",
        "x = a < b or not (c in d) and e != f\n",
        "x = -y[1][2:3][::2].attr(1, k = 2, *a, **kw)\n",
        "x = 'a\\nb\\x07' + r'c\\d'\n",
        "x = (1, 2.5, [3], {4: 5}, {6, 7}, (), None)\n",
        "x = 1 if c else (2 if d else 3)\n",
        "f = lambda a, b = 1, *args, k, **kw: a + b\n",
        "x = [a * b for a in y for b in z if a != b]\n",
        "x = {k: v for k, v in pairs}\n",
        "x = {e for e in items}\n",
        "x = 1e100\ny = 2.0\nz = 12345678901234567890\n",
    ] {
        assert_round_trips(source);
    }
}

#[test]
fn statements_round_trip() {
    for source in &[
        "def f(a, b = 1, *args, k, kd = 2, **kw):\n  return a\n",
        "for x, (y, z) in triples:\n  pass\n",
        "if a:\n  b = 1\nelif c:\n  d = 2\nelse:\n  e = 3\n",
        "while x:\n  x -= 1\n  if x:\n    continue\n  break\n",
        "load('lib.sky', 'a', b = 'c')\n",
        "a, b = b, a\n",
        "x = 1; y = 2; z = x + y\n",
        "t = 1,\nu = ()\n",
        "a[0] += f(x)\na.b *= 2\n",
        "def outer():\n  def inner():\n    return 1\n  return inner\n",
    ] {
        assert_round_trips(source);
    }
}

#[test]
fn printing_is_stable_on_already_printed_output() {
    let source = "def f(x):\n  return [y * y for y in range(x) if y % 2 == 0]\nresult = f(10)\n";
    let once = printed(source);
    assert_eq!(once, printed(&once));
    assert_eq!(once, printed(&printed(&once)));
}
