//! The fixed C preamble emitted verbatim at the top of every generated
//! translation unit: standard includes, the opaque runtime types, the
//! fully-defined `SchemeDatum` quoted-literal representation, and
//! `extern` declarations for the fixed runtime surface (spec.md §6).
//!
//! `arena_create`/`arena_destroy`/`arena_alloc` are not literally named
//! in that surface but are required to make the `Arena` type usable from
//! generated code at all; see `DESIGN.md`.

pub const PREAMBLE: &str = r#"#include <stdbool.h>
#include <stdint.h>
#include <stdio.h>
#include <stdlib.h>
#include <string.h>

typedef struct Arena Arena;
typedef struct VectorF VectorF;
typedef struct SchemeValue SchemeValue;

typedef struct ClosureRef {
    void* function_pointer;
    void* environment_pointer;
} ClosureRef;

/// Runtime representation of a quoted literal: enough of a tagged union
/// to hold any datum a `quote` can produce, including the heterogeneous
/// elements of a quoted list or dotted pair.
typedef enum SchemeDatumTag {
    SCHEME_DATUM_NULL,
    SCHEME_DATUM_INT,
    SCHEME_DATUM_FLOAT,
    SCHEME_DATUM_BOOL,
    SCHEME_DATUM_CHAR,
    SCHEME_DATUM_STRING,
    SCHEME_DATUM_SYMBOL,
    SCHEME_DATUM_PAIR,
} SchemeDatumTag;

typedef struct SchemeDatum {
    SchemeDatumTag tag;
    union {
        int64_t as_int;
        double as_float;
        bool as_bool;
        char as_char;
        const char* as_string;
        const char* as_symbol;
        struct {
            const struct SchemeDatum* car;
            const struct SchemeDatum* cdr;
        } as_pair;
    } value;
} SchemeDatum;

extern Arena* arena_create(void);
extern void arena_destroy(Arena* arena);
extern void* arena_alloc(Arena* arena, size_t size);

extern VectorF vector_f_create_from_array(const double* values, size_t count);
extern VectorF vector_f_add(VectorF a, VectorF b);
extern VectorF vector_f_sub(VectorF a, VectorF b);
extern VectorF vector_f_mul_scalar(VectorF v, double scalar);
extern double vector_f_dot(VectorF a, VectorF b);
extern VectorF vector_f_cross(VectorF a, VectorF b);
extern double vector_f_magnitude(VectorF v);
extern double vector_f_get(VectorF v, size_t index);

extern VectorF compute_gradient(ClosureRef f, VectorF at);
extern double compute_divergence(ClosureRef f, VectorF at);
extern VectorF compute_curl(ClosureRef f, VectorF at);
extern double compute_laplacian(ClosureRef f, VectorF at);
extern double compute_gradient_autodiff(ClosureRef f, double at);
extern double compute_gradient_reverse_mode(ClosureRef f, double at);
extern VectorF compute_jacobian(ClosureRef f, VectorF at);
extern VectorF compute_hessian(ClosureRef f, VectorF at);
extern double compute_nth_derivative(ClosureRef f, double at, int n);

extern void scheme_display_int(int64_t value);
extern void scheme_display_float(double value);
extern void scheme_display_bool(bool value);
extern void scheme_display_char(char value);
extern void scheme_display_string(const char* value);
extern void scheme_display_value(SchemeValue value);
extern const char* scheme_number_to_string(double value);
extern const char* scheme_string_append(const char* a, const char* b);
extern SchemeValue scheme_value_void(void);
"#;
