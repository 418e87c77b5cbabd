//! GLSL ES 3.00 sources for the tower scene.

/// Lit, normal-mapped, shadow-receiving solids (blocks and floor).
pub const SOLID_VERTEX: &str = "#version 300 es
precision highp float;

uniform mat3 u_invLightRotation;
uniform mat4 u_lightXform;
uniform mat4 u_lightProjection;
uniform mat4 u_viewXform;
uniform mat4 u_cameraProjection;
uniform vec3 u_viewPos;
uniform mat4 u_modelMatrix;
uniform mat3 u_normalMatrix;

in vec3 a_pos;
in vec3 a_normal;
in vec3 a_tangent;
in vec2 a_texCoord;

out vec3 f_posTangentSpace;
out vec4 f_posLightSpace;
out vec3 f_lightDir;
out vec3 f_viewPos;
out vec2 f_texCoord;

void main() {
    vec3 normal = u_normalMatrix * a_normal;
    vec3 tangent = u_normalMatrix * a_tangent;
    vec3 bitangent = cross(normal, tangent);
    mat3 tbn = transpose(mat3(tangent, bitangent, normal));

    vec4 worldPos = u_modelMatrix * vec4(a_pos, 1.0);
    f_posLightSpace = u_lightProjection * u_lightXform * worldPos;
    f_posTangentSpace = tbn * vec3(worldPos);
    f_lightDir = tbn * (u_invLightRotation * vec3(0.0, 0.0, -1.0));
    f_viewPos = tbn * u_viewPos;
    f_texCoord = a_texCoord;

    gl_Position = u_cameraProjection * u_viewXform * worldPos;
}
";

pub const SOLID_FRAGMENT: &str = "#version 300 es
precision mediump float;

uniform float u_ambient;
uniform float u_specular;
uniform float u_shininess;
uniform vec3 u_lightColor;
uniform sampler2D u_texDiffuse;
uniform sampler2D u_texSpecular;
uniform sampler2D u_texNormal;
uniform mediump sampler2DShadow u_texShadow;

in vec3 f_posTangentSpace;
in vec4 f_posLightSpace;
in vec3 f_lightDir;
in vec3 f_viewPos;
in vec2 f_texCoord;

out vec4 FragColor;

void main() {
    vec3 texDiffuse = texture(u_texDiffuse, f_texCoord).rgb;
    float texSpecular = texture(u_texSpecular, f_texCoord).r;
    vec3 normal = normalize(texture(u_texNormal, f_texCoord).rgb * 2.0 - 1.0);

    vec3 lightDir = normalize(f_lightDir);
    vec3 viewDir = normalize(f_viewPos - f_posTangentSpace);
    vec3 halfway = normalize(lightDir + viewDir);

    float diffuse = max(dot(normal, lightDir), 0.0);
    float specular = pow(max(dot(normal, halfway), 0.0), u_shininess) * u_specular * texSpecular;

    vec3 projCoords = f_posLightSpace.xyz / f_posLightSpace.w;
    float lit = texture(u_texShadow, vec3(projCoords.xy, projCoords.z - 0.002));

    vec3 color = texDiffuse * (u_ambient + lit * diffuse) + lit * specular;
    FragColor = vec4(color * u_lightColor, 1.0);
}
";

/// Background cube drawn at the far plane.
pub const SKY_VERTEX: &str = "#version 300 es
precision highp float;

uniform mat3 u_lightRotation;
uniform mat3 u_viewRotation;
uniform mat4 u_cameraProjection;

in vec3 a_pos;

out vec3 f_texCoord;

void main() {
    f_texCoord = u_lightRotation * a_pos;
    vec4 ndcPos = u_cameraProjection * inverse(mat4(u_viewRotation)) * vec4(a_pos, 1.0);
    gl_Position = ndcPos.xyww;
}
";

pub const SKY_FRAGMENT: &str = "#version 300 es
precision mediump float;

uniform samplerCube u_skybox;

in vec3 f_texCoord;

out vec4 FragColor;

void main() {
    FragColor = texture(u_skybox, f_texCoord);
}
";

/// Depth-only pass from the light's point of view.
pub const SHADOW_VERTEX: &str = "#version 300 es
precision highp float;

layout(location = 0) in vec3 a_pos;

uniform mat4 u_modelMatrix;
uniform mat4 u_lightXform;
uniform mat4 u_lightProjection;

void main() {
    gl_Position = u_lightProjection * u_lightXform * u_modelMatrix * vec4(a_pos, 1.0);
}
";

pub const SHADOW_FRAGMENT: &str = "#version 300 es
precision mediump float;

void main() {}
";
