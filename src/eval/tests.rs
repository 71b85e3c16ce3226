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

//! Evaluator tests driven by source snippets.

use crate::syntax::dialect::Dialect;
use crate::testutil::{starlark_eval, starlark_eval_dialect, starlark_fail_code};
use crate::values::error;
use crate::{starlark_fail, starlark_ok};

fn repr_of(snippet: &str) -> String {
    starlark_eval(snippet).unwrap().to_repr()
}

#[test]
fn arithmetic() {
    starlark_ok!("1 + 2 * 3 == 7");
    starlark_ok!("(3 // 2, 3 / 2, -7 % 3, -7 // 3) == (1, 1.5, 2, -3)");
    starlark_ok!("5 % 3 == 2 and -5 % 3 == 1 and 5 % -3 == -1");
    starlark_ok!("1 << 4 == 16 and 255 >> 4 == 15");
    starlark_ok!("(6 | 1, 6 & 3, 6 ^ 3) == (7, 2, 5)");
    starlark_ok!("1 == 1.0 and 1 < 1.5 and 2.0 * 2 == 4");
    starlark_fail!("1 // 0", error::DIVISION_BY_ZERO_ERROR_CODE);
    starlark_fail!("1 % 0", error::DIVISION_BY_ZERO_ERROR_CODE);
    starlark_fail!("1 << -1", error::NEGATIVE_SHIFT_COUNT_ERROR_CODE);
    starlark_fail!("[1, 2, 3][::0]", error::STRIDE_ZERO_ERROR_CODE);
}

#[test]
fn big_integers_stay_exact() {
    starlark_ok!("99999999999999999999 + 1 == 100000000000000000000");
    starlark_ok!("2 * 123456789012345678901234567890 == 246913578024691357802469135780");
    starlark_ok!("(1 << 100) // (1 << 50) == 1 << 50");
}

#[test]
fn strings() {
    starlark_ok!("'abc' + 'def' == 'abcdef'");
    starlark_ok!("'ab' * 3 == 'ababab'");
    starlark_ok!("'b' in 'abc' and 'z' not in 'abc'");
    starlark_ok!("'banana'[1::2] == 'aaa'");
    starlark_ok!("len('héllo') == 5");
    starlark_ok!("'a %s c' % 3 == 'a 3 c'");
    starlark_ok!("'%d %o %x %c' % (65, 65, 65, 65) == '65 101 41 A'");
    starlark_ok!("'%(x)d!' % {'x': 3} == '3!'");
    starlark_ok!("'{} {name}'.format(1, name = 'x') == '1 x'");
}

#[test]
fn lists() {
    starlark_ok!("[x * x for x in range(5)] == [0, 1, 4, 9, 16]");
    starlark_ok!("[1, 2] + [3] == [1, 2, 3]");
    starlark_ok!("[1] * 3 == [1, 1, 1] and [1] * -1 == []");
    starlark_ok!("l = [1, 2, 3]\nl[1] = 9\nl == [1, 9, 3]");
    starlark_ok!("l = [3, 1, 2]\nl.append(4)\nl.remove(3)\nl == [1, 2, 4]");
    starlark_ok!("[1, 2, 3][-1] == 3 and [1, 2, 3][:2] == [1, 2]");
    starlark_ok!("l = [1, 2]\nl.extend(l)\nl == [1, 2, 1, 2]");
    starlark_ok!("[1, 2].index(2) == 1");
    starlark_ok!("l = [1, 2, 3]\nl.pop() == 3 and l.pop(0) == 1 and l == [2]");
}

#[test]
fn augmented_assignment_on_lists_mutates_in_place() {
    starlark_ok!("l = [1]\nalias = l\nl += [2]\nalias == [1, 2]");
    // By contrast, `+` allocates.
    starlark_ok!("l = [1]\nalias = l\nl = l + [2]\nalias == [1]");
}

#[test]
fn tuples() {
    starlark_ok!("(1, 2) + (3,) == (1, 2, 3)");
    starlark_ok!("t = (1, 2)\na, b = t\na == 1 and b == 2");
    starlark_ok!("() == () and (1,) != (1, 2)");
    starlark_ok!("(1, 2) < (1, 3) and (1,) < (1, 0)");
    starlark_fail!("a, b = [1, 2, 3]", crate::eval::INCORRECT_UNPACK_ERROR_CODE);
}

#[test]
fn dicts() {
    starlark_ok!("{'a': 1}['a'] == 1");
    starlark_ok!("d = {'a': 1}\nd['b'] = 2\nd.update([('a', 3)])\nd.items() == [('a', 3), ('b', 2)]");
    starlark_ok!("d = {1: 'a', 2: 'b'}\nd.keys() == [1, 2] and d.values() == ['a', 'b']");
    starlark_ok!("({'a': 1} | {'b': 2}).keys() == ['a', 'b']");
    starlark_ok!("d = {'a': 1, 'b': 2} | {'c': 3, 'a': 9}\nd.items() == [('a', 9), ('b', 2), ('c', 3)]");
    starlark_ok!("{k: v for k, v in [(1, 2), (3, 4)]} == {1: 2, 3: 4}");
    starlark_ok!("1 in {1: 2} and 3 not in {1: 2}");
    starlark_ok!("{1: 'int'} == {1.0: 'int'}");
    starlark_fail!("{[]: 1}", error::NOT_HASHABLE_VALUE_ERROR_CODE);
    starlark_fail!("{'a': 1}['z']", error::KEY_NOT_FOUND_ERROR_CODE);
}

#[test]
fn sets() {
    starlark_ok!("set([1, 2, 1]) == set([2, 1])");
    starlark_ok!("s = {1, 2}\ns.add(3)\ns == set([1, 2, 3])");
    starlark_ok!("{1} < {1, 2} and not ({1} < {1})");
    starlark_ok!("(set([1, 2]) | set([3, 1])) == set([1, 2, 3])");
    starlark_ok!("{x for x in [1, 2, 2, 3]} == set([1, 2, 3])");
    starlark_ok!("1 in {1, 2} and 5 not in {1, 2}");
}

#[test]
fn control_flow() {
    starlark_ok!("total = 0\nfor x in range(10):\n  if x % 2 == 0:\n    continue\n  total += x\ntotal == 25");
    starlark_ok!("r = []\nfor x in [1, 2, 3, 4]:\n  if x == 3:\n    break\n  r.append(x)\nr == [1, 2]");
    starlark_ok!("x = 1 if True else 2\nx == 1");
}

#[test]
fn while_requires_the_recursion_dialect() {
    assert_eq!(
        crate::resolve::WHILE_NOT_ALLOWED_ERROR_CODE,
        starlark_fail_code("while True:\n  pass")
    );
    let dialect = Dialect::EXTENDED;
    let v = starlark_eval_dialect(
        "n = 0\nwhile n < 5:\n  n += 1\nn == 5",
        &dialect,
    )
    .unwrap();
    assert!(v.to_bool());
}

#[test]
fn functions_and_arguments() {
    starlark_ok!("def f(a, b = 2):\n  return a + b\nf(1) == 3 and f(1, 5) == 6 and f(b = 1, a = 2) == 3");
    starlark_ok!("def f(*args, **kwargs):\n  return (args, kwargs.items())\nf(1, 2, x = 3) == ((1, 2), [('x', 3)])");
    starlark_ok!("def f(a, b):\n  return a - b\nf(*[10, 4]) == 6 and f(10, **{'b': 4}) == 6");
    starlark_ok!("def f(a, *, k):\n  return a + k\nf(1, k = 2) == 3");
    starlark_ok!("def f():\n  pass\nf() == None");
}

#[test]
fn argument_binding_errors_are_distinct() {
    // Missing, duplicate and unexpected arguments have separate codes.
    starlark_fail!("def f(a):\n  pass\nf()", "CF00");
    starlark_fail!("def f(a):\n  pass\nf(1, a = 2)", "CF01");
    starlark_fail!("def f(a):\n  pass\nf(1, b = 2)", "CF02");
    starlark_fail!("def f(a):\n  pass\nf(1, 2)", "CF03");
    starlark_fail!("def f(a, *, k):\n  pass\nf(1, 2)", "CF03");
    starlark_fail!("def f(a):\n  pass\nf(1, **{'a': 2})", "CF01");
}

#[test]
fn call_ordering_is_left_to_right() {
    starlark_ok!(
        "order = []\ndef note(x):\n  order.append(x)\n  return x\ndef f(a, b, c = 0):\n  \
         return a\nf(note(1), b = note(2), c = note(3))\norder == [1, 2, 3]"
    );
}

#[test]
fn closures_capture_cells() {
    starlark_ok!("def make(n):\n  def f():\n    return n\n  return f\nmake(3)() == 3");
    // Closures capture the variable (its cell), not its value: both lambdas
    // see the final state of the comprehension variable.
    starlark_ok!(
        "def make():\n  fs = [lambda x: x + i for i in [1, 2]]\n  return fs\n\
         [f(10) for f in make()] == [12, 12]"
    );
    starlark_ok!("def outer(a):\n  def middle():\n    def inner():\n      return a\n    return inner\n  return middle\nouter(7)()() == 7");
}

#[test]
fn lambdas() {
    starlark_ok!("(lambda x: x + 1)(2) == 3");
    starlark_ok!("f = lambda x, y = 10: x * y\nf(2) == 20 and f(2, 3) == 6");
    starlark_ok!("sorted([3, 1, 2], key = lambda x: -x) == [3, 2, 1]");
}

#[test]
fn default_values_are_shared_mutable_state() {
    starlark_ok!("def f(x, l = []):\n  l.append(x)\n  return l\nf(1) == [1] and f(2) == [1, 2]");
}

#[test]
fn recursion_is_rejected_by_default() {
    starlark_fail!(
        "def f():\n  f()\nf()",
        crate::eval::RECURSION_ERROR_CODE
    );
    starlark_fail!(
        "def f():\n  g()\ndef g():\n  f()\nf()",
        crate::eval::RECURSION_ERROR_CODE
    );
    // The extended dialect permits it.
    let v = starlark_eval_dialect(
        "def fact(n):\n  return 1 if n <= 1 else n * fact(n - 1)\nfact(5) == 120",
        &Dialect::EXTENDED,
    )
    .unwrap();
    assert!(v.to_bool());
}

#[test]
fn iterator_invalidation() {
    starlark_fail!(
        "l = [1, 2, 3]\nfor x in l:\n  l.append(x)",
        error::MUTATION_DURING_ITERATION_ERROR_CODE
    );
    starlark_fail!(
        "d = {1: 2}\nfor k in d:\n  d[k * 10] = 1",
        error::MUTATION_DURING_ITERATION_ERROR_CODE
    );
    starlark_fail!(
        "l = [1, 2]\n[l.pop() for x in l]",
        error::MUTATION_DURING_ITERATION_ERROR_CODE
    );
    // After the loop the container is mutable again.
    starlark_ok!("l = [1, 2]\nfor x in l:\n  pass\nl.append(3)\nl == [1, 2, 3]");
}

#[test]
fn comprehension_scoping() {
    starlark_ok!("x = 5\ny = [x for x in [1]]\nx == 5");
    starlark_ok!("[x + y for x in [1, 2] for y in [10, 20]] == [11, 21, 12, 22]");
    starlark_ok!("[x for x in [1, 2, 3] if x != 2] == [1, 3]");
    starlark_ok!("m = [[1, 2], [3]]\n[x for xs in m for x in xs] == [1, 2, 3]");
}

#[test]
fn short_circuit_evaluation() {
    starlark_ok!("True or [][5]\nTrue");
    starlark_ok!("False and [][5]\nTrue");
    starlark_ok!("(0 or 'd') == 'd' and (1 and 'd') == 'd'");
}

#[test]
fn builtins() {
    starlark_ok!("any([0, 1]) and not any([0, 0]) and all([1, 1]) and not all([0, 1])");
    starlark_ok!("bool(1) and not bool('') and not bool(None)");
    starlark_ok!("chr(65) == 'A' and ord('A') == 65");
    starlark_ok!("int('41', 16) == 65 and int('-12') == -12 and int(2.9) == 2 and int(True) == 1");
    starlark_ok!("float(2) == 2.0 and float('1.5') == 1.5");
    starlark_ok!("list((1, 2)) == [1, 2] and tuple([1, 2]) == (1, 2)");
    starlark_ok!("len([1, 2]) == 2 and len('abc') == 3 and len({1: 2}) == 1");
    starlark_ok!("min([3, 1, 2]) == 1 and max(3, 1, 2) == 3");
    starlark_ok!("min([3, -1], key = lambda x: x * x) == -1");
    starlark_ok!("sorted([3, 1, 2]) == [1, 2, 3] and sorted([1, 2], reverse = True) == [2, 1]");
    starlark_ok!("reversed([1, 2, 3]) == [3, 2, 1]");
    starlark_ok!("enumerate(['a', 'b']) == [(0, 'a'), (1, 'b')]");
    starlark_ok!("zip([1, 2], ['a', 'b', 'c']) == [(1, 'a'), (2, 'b')]");
    starlark_ok!("type(1) == 'int' and type('') == 'string' and type(None) == 'NoneType'");
    starlark_ok!("repr([1, 'a']) == '[1, \"a\"]' and str(1) == '1'");
    starlark_ok!("hash('abc') == 96354");
    starlark_fail!("fail('boom')", "CR99");
    starlark_fail!("min([])", "CR05");
    starlark_fail!("chr(-1)", "CR00");
    starlark_fail!("int('zz')", "CR03");
    starlark_fail!("range(1, 10, 0)", "CR06");
}

#[test]
fn ranges_are_lazy_views() {
    starlark_ok!("list(range(5)) == [0, 1, 2, 3, 4]");
    starlark_ok!("list(range(2, 5)) == [2, 3, 4]");
    starlark_ok!("list(range(10, 0, -3)) == [10, 7, 4, 1]");
    starlark_ok!("len(range(1000000000)) == 1000000000");
    starlark_ok!("4 in range(0, 10, 2) and 5 not in range(0, 10, 2)");
    starlark_ok!("range(0, 10, 2)[3] == 6");
}

#[test]
fn attribute_reflection() {
    starlark_ok!("hasattr('', 'startswith') and not hasattr('', 'nonsense')");
    starlark_ok!("getattr('ab', 'upper')() == 'AB'");
    starlark_ok!("getattr([], 'missing', 42) == 42");
    starlark_ok!("'append' in dir([])");
}

#[test]
fn string_methods() {
    starlark_ok!("'a,b,c'.split(',') == ['a', 'b', 'c']");
    starlark_ok!("' a b '.split() == ['a', 'b']");
    starlark_ok!("','.join(['a', 'b']) == 'a,b'");
    starlark_ok!("'  x '.strip() == 'x' and ' x'.lstrip() == 'x' and 'x '.rstrip() == 'x'");
    starlark_ok!("'aXbXc'.replace('X', '-') == 'a-b-c'");
    starlark_ok!("'abc'.find('bc') == 1 and 'abc'.find('z') == -1");
    starlark_ok!("'abc'.startswith('ab') and 'abc'.endswith('bc')");
    starlark_ok!("'aaa'.count('aa') == 1 and 'abcabc'.count('abc') == 2");
    starlark_ok!("'hello world'.title() == 'Hello World'");
    starlark_ok!("'abc'.elems() == ['a', 'b', 'c']");
    starlark_ok!("'ab'.codepoints() == [97, 98]");
    starlark_ok!("'a\\nb'.splitlines() == ['a', 'b']");
}

#[test]
fn undefined_variables_error_at_runtime_when_unassigned() {
    starlark_fail!("def f():\n  x = y\n  y = 1\nf()", "CM02");
}

#[test]
fn equality_and_identity() {
    starlark_ok!("[] == [] and [1] != [2]");
    starlark_ok!("def f():\n  pass\ndef g():\n  pass\nf == f and f != g");
    starlark_ok!("None == None and None != 0 and True != 1");
}

#[test]
fn cyclic_values_print_without_recursing() {
    assert_eq!("[1, [...]]", repr_of("l = [1]\nl.append(l)\nl"));
}

#[test]
fn strings_are_not_iterable() {
    starlark_fail!("[x for x in 'abc']");
    starlark_fail!("len(3)");
}
